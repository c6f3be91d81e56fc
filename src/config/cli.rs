use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the medusa binary.
#[derive(Debug, Parser)]
#[command(
    name = "medusa",
    version,
    about = "Regenerate static output when models are saved"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MEDUSA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the background worker that processes queued path updates.
    Worker(Box<WorkerArgs>),
    /// Regenerate the given paths as if a renderable model had been saved.
    Update(UpdateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct WorkerArgs {
    #[command(flatten)]
    pub overrides: WorkerOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub overrides: UpdateOverrides,

    /// Paths to regenerate; with none, the output is re-published unchanged.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct OutputOverrides {
    /// Override the directory static output is published to.
    #[arg(long = "output-deploy-dir", value_name = "PATH")]
    pub deploy_dir: Option<PathBuf>,

    /// Override the origin pages are fetched from.
    #[arg(long = "output-origin-url", value_name = "URL")]
    pub origin_url: Option<String>,

    /// Override how many pages are fetched at once.
    #[arg(long = "output-concurrency", value_name = "COUNT")]
    pub concurrency: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WorkerOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub output: OutputOverrides,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the update-paths worker concurrency.
    #[arg(long = "jobs-update-paths-concurrency", value_name = "COUNT")]
    pub jobs_update_paths_concurrency: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct UpdateOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub output: OutputOverrides,

    /// Enqueue the update instead of rendering inline.
    #[arg(
        long = "update-async",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub update_async: Option<bool>,
}
