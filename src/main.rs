use std::{process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use medusa::{
    application::{
        dispatcher::RenderDispatcher,
        error::AppError,
        jobs::{JobWorkerContext, RenderQueue, process_update_paths_job},
        notifier::{ChangeNotifier, NotifierSettings, NotifyOutcome},
        renderable::ManualUpdate,
    },
    config,
    domain::paths::static_paths,
    infra::{
        db,
        disk::{DiskStaticSiteRenderer, HttpPageSource},
        error::InfraError,
        queue::{DisabledRenderQueue, PostgresRenderQueue, update_paths_storage},
        telemetry,
    },
};
use sqlx::postgres::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let causes = error.chain();

    if dispatcher::has_been_set() {
        error!(error = %error, causes = ?causes, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, causes = ?causes, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Worker(Box::<config::WorkerArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Worker(_) => run_worker(settings).await,
        config::Command::Update(args) => run_update(settings, args).await,
    }
}

async fn run_worker(settings: config::Settings) -> Result<(), AppError> {
    let pool = init_job_storage(&settings).await?;
    let context = JobWorkerContext {
        dispatcher: build_dispatcher(&settings.output)?,
    };

    info!(
        target = "medusa::worker",
        deploy_dir = %settings.output.deploy_dir.display(),
        origin = %settings.output.origin_url,
        concurrency = settings.jobs.update_paths_concurrency.get(),
        "Starting update-paths worker"
    );

    let monitor_handle = spawn_job_monitor(pool, context, &settings.jobs);

    let result = tokio::signal::ctrl_c()
        .await
        .map_err(|err| AppError::from(InfraError::Signal(err)));
    info!(target = "medusa::worker", "Shutting down worker");

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_update(settings: config::Settings, args: config::UpdateArgs) -> Result<(), AppError> {
    let dispatcher = build_dispatcher(&settings.output)?;
    let notifier_settings = NotifierSettings::from(&settings.regenerate);

    let queue: Arc<dyn RenderQueue> = if notifier_settings.update_async {
        if settings.database.url.is_none() {
            return Err(AppError::validation(
                "`--update-async` requires `database.url` to be configured",
            ));
        }
        let pool = init_job_storage(&settings).await?;
        Arc::new(PostgresRenderQueue::new(
            pool,
            settings.jobs.max_attempts.get() as i32,
        ))
    } else {
        Arc::new(DisabledRenderQueue)
    };

    let notifier =
        ChangeNotifier::new(notifier_settings, dispatcher, queue).subscribe::<ManualUpdate>();

    let update = ManualUpdate::new(static_paths(args.paths));
    match notifier.post_save(&update).await? {
        NotifyOutcome::Rendered { paths } => info!(
            target = "medusa::update",
            path_count = paths.len(),
            deploy_dir = %settings.output.deploy_dir.display(),
            "Paths regenerated"
        ),
        NotifyOutcome::Enqueued { job_id, paths } => info!(
            target = "medusa::update",
            job_id = %job_id,
            path_count = paths.len(),
            "Paths enqueued"
        ),
        NotifyOutcome::Skipped => {
            return Err(AppError::unexpected("manual update was not subscribed"));
        }
    }

    Ok(())
}

async fn init_job_storage(settings: &config::Settings) -> Result<PgPool, AppError> {
    let pool = db::connect(&settings.database).await?;
    db::health_check(&pool).await?;
    db::prepare_job_storage(&pool).await?;
    Ok(pool)
}

fn build_dispatcher(output: &config::OutputSettings) -> Result<RenderDispatcher, AppError> {
    let source = HttpPageSource::new(output.origin_url.clone(), output.request_timeout)?;
    let renderer =
        DiskStaticSiteRenderer::new(&output.deploy_dir, Arc::new(source), output.concurrency)?;
    Ok(RenderDispatcher::new(Arc::new(renderer)))
}

fn spawn_job_monitor(
    pool: PgPool,
    context: JobWorkerContext,
    jobs: &config::JobsSettings,
) -> tokio::task::JoinHandle<()> {
    let update_paths_worker = WorkerBuilder::new("update-paths-worker")
        .concurrency(jobs.update_paths_concurrency.get() as usize)
        .data(context)
        .backend(update_paths_storage(pool))
        .build_fn(process_update_paths_job);

    let monitor = Monitor::new().register(update_paths_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}
