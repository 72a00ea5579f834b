use std::{future::IntoFuture, pin::pin, process, sync::Arc};

use rapid_typst::{
    application::{
        compile::{ExportArtifact, RenderPipeline, TypstCli, TypstLibraryCompiler, Workspace},
        documents::DocumentService,
        error::AppError,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let library = tokio::task::spawn_blocking(TypstLibraryCompiler::load)
        .await
        .map_err(|err| AppError::unexpected(format!("typst library failed to load: {err}")))?;
    let pipeline = build_pipeline(&settings.compile, library)?;
    let repositories = init_repositories(&settings).await?;

    let documents = DocumentService::new(repositories.clone(), repositories.clone());
    let state = ApiState {
        documents: Arc::new(documents),
        pipeline: Arc::new(pipeline),
        health: repositories,
    };

    serve_http(&settings, state).await
}

async fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let output = args.output_path();
    if output == args.input {
        return Err(AppError::validation(format!(
            "refusing to overwrite the input file {}",
            args.input.display()
        )));
    }

    let markup = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|err| {
            AppError::unexpected(format!("failed to read {}: {err}", args.input.display()))
        })?;

    info!(
        target = "rapid_typst::export",
        input = %args.input.display(),
        format = %args.format,
        "Starting export"
    );

    let pipeline = build_pipeline(&settings.compile, TypstLibraryCompiler::lazy())?;
    let outcome = pipeline.render_export(args.format, &markup).await?;
    let artifact =
        ExportArtifact::from_outcome(args.format, outcome).map_err(AppError::validation)?;

    tokio::fs::write(&output, &artifact.bytes)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "rapid_typst::export",
        output = %output.display(),
        bytes = artifact.bytes.len(),
        "Export completed"
    );
    Ok(())
}

fn build_pipeline(
    settings: &config::CompileSettings,
    library: TypstLibraryCompiler,
) -> Result<RenderPipeline, AppError> {
    let workspace = Workspace::create(&settings.scratch_dir)
        .map_err(|err| AppError::from(InfraError::scratch(&settings.scratch_dir, err)))?;
    let pages = TypstCli::new(&settings.typst_cli_path, settings.timeout)
        .with_page_pattern(settings.page_pattern.clone());
    info!(
        target = "rapid_typst::startup",
        scratch_dir = %workspace.root().display(),
        typst_cli = %settings.typst_cli_path.display(),
        timeout_secs = settings.timeout.as_secs(),
        "Compile pipeline ready"
    );

    Ok(RenderPipeline::new(
        workspace,
        Arc::new(pages),
        Arc::new(library),
    ))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state, &settings.cors).map_err(AppError::from)?;
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "rapid_typst::startup",
        addr = %settings.server.addr,
        "HTTP server listening"
    );

    let (drain_tx, mut drain_rx) = oneshot::channel();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        },
    );
    let mut server = pin!(server.into_future());

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        Ok(()) = &mut drain_rx => {}
    }

    // In-flight requests get a bounded window to finish once draining starts.
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(
                target = "rapid_typst::shutdown",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown window elapsed; dropping remaining connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "rapid_typst::shutdown", error = %err, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "rapid_typst::shutdown", error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(target = "rapid_typst::shutdown", "Shutdown signal received, draining requests");
}
