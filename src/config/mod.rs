//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, LoggingOverrides, OutputOverrides, UpdateArgs,
    UpdateOverrides, WorkerArgs, WorkerOverrides,
};

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::notifier::NotifierSettings;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "medusa";
const ENV_PREFIX: &str = "MEDUSA";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_DEPLOY_DIR: &str = "public";
const DEFAULT_ORIGIN_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_OUTPUT_CONCURRENCY: u32 = 4;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JOB_UPDATE_PATHS_CONCURRENCY: u32 = 1;
const DEFAULT_JOB_MAX_ATTEMPTS: u32 = 25;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub regenerate: RegenerateSettings,
    pub output: OutputSettings,
    pub jobs: JobsSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerateSettings {
    /// Enqueue regeneration on the job queue instead of rendering inline.
    pub update_async: bool,
}

impl From<&RegenerateSettings> for NotifierSettings {
    fn from(settings: &RegenerateSettings) -> Self {
        NotifierSettings {
            update_async: settings.update_async,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub deploy_dir: PathBuf,
    pub origin_url: Url,
    pub concurrency: NonZeroUsize,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct JobsSettings {
    pub update_paths_concurrency: NonZeroU32,
    pub max_attempts: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Worker(args)) => raw.apply_worker_overrides(&args.overrides),
        Some(Command::Update(args)) => raw.apply_update_overrides(&args.overrides),
        None => raw.apply_worker_overrides(&WorkerOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    regenerate: RawRegenerateSettings,
    output: RawOutputSettings,
    jobs: RawJobsSettings,
}

impl RawSettings {
    fn apply_worker_overrides(&mut self, overrides: &WorkerOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        self.apply_database_override(&overrides.database);
        self.apply_output_overrides(&overrides.output);

        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(value) = overrides.jobs_update_paths_concurrency {
            self.jobs.update_paths_concurrency = Some(value);
        }
    }

    fn apply_update_overrides(&mut self, overrides: &UpdateOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        self.apply_database_override(&overrides.database);
        self.apply_output_overrides(&overrides.output);

        if let Some(update_async) = overrides.update_async {
            self.regenerate.update_async = Some(update_async);
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_output_overrides(&mut self, overrides: &OutputOverrides) {
        if let Some(dir) = overrides.deploy_dir.as_ref() {
            self.output.deploy_dir = Some(dir.clone());
        }
        if let Some(url) = overrides.origin_url.as_ref() {
            self.output.origin_url = Some(url.clone());
        }
        if let Some(concurrency) = overrides.concurrency {
            self.output.concurrency = Some(concurrency);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            regenerate,
            output,
            jobs,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            regenerate: RegenerateSettings {
                update_async: regenerate.update_async.unwrap_or(false),
            },
            output: build_output_settings(output)?,
            jobs: build_jobs_settings(jobs)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_output_settings(output: RawOutputSettings) -> Result<OutputSettings, LoadError> {
    let deploy_dir = output
        .deploy_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOY_DIR));
    if deploy_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "output.deploy_dir",
            "path must not be empty",
        ));
    }
    if deploy_dir.file_name().is_none() {
        return Err(LoadError::invalid(
            "output.deploy_dir",
            "path must name a directory",
        ));
    }

    let origin_url = parse_origin(
        output
            .origin_url
            .as_deref()
            .unwrap_or(DEFAULT_ORIGIN_URL),
    )?;

    let concurrency = non_zero_u32(
        output
            .concurrency
            .unwrap_or(DEFAULT_OUTPUT_CONCURRENCY)
            .into(),
        "output.concurrency",
    )?;
    let concurrency = usize::try_from(concurrency.get())
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid("output.concurrency", "value exceeds supported range")
        })?;

    let timeout_secs = output
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "output.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(OutputSettings {
        deploy_dir,
        origin_url,
        concurrency,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_jobs_settings(jobs: RawJobsSettings) -> Result<JobsSettings, LoadError> {
    let update_paths = jobs
        .update_paths_concurrency
        .unwrap_or(DEFAULT_JOB_UPDATE_PATHS_CONCURRENCY);
    let max_attempts = jobs.max_attempts.unwrap_or(DEFAULT_JOB_MAX_ATTEMPTS);
    if i32::try_from(max_attempts).is_err() {
        return Err(LoadError::invalid(
            "jobs.max_attempts",
            "value exceeds supported range for i32",
        ));
    }

    Ok(JobsSettings {
        update_paths_concurrency: non_zero_u32(
            update_paths.into(),
            "jobs.update_paths_concurrency",
        )?,
        max_attempts: non_zero_u32(max_attempts.into(), "jobs.max_attempts")?,
    })
}

/// Parse the origin and make sure relative joins stay under its path.
fn parse_origin(value: &str) -> Result<Url, LoadError> {
    let mut url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid("output.origin_url", format!("invalid url: {err}")))?;

    if url.cannot_be_a_base() {
        return Err(LoadError::invalid(
            "output.origin_url",
            "url cannot be used as a base",
        ));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "output.origin_url",
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRegenerateSettings {
    update_async: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOutputSettings {
    deploy_dir: Option<PathBuf>,
    origin_url: Option<String>,
    concurrency: Option<u32>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawJobsSettings {
    update_paths_concurrency: Option<u32>,
    max_attempts: Option<u32>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
