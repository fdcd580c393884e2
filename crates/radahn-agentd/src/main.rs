mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use radahn_api::{ApiHandler, HttpApi, Orchestrator, axum};
use radahn_core::{EventBus, JobFactory, TaskRegistry, events::DEFAULT_CAPACITY};
use radahn_model::ClientEvent;
use radahn_observe::init_logger;
use radahn_relay::{ControlChannel, TelemetryRelay};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Command, ListenArgs, ServeArgs, StopArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before the runtime starts: the local UTC offset is only readable while single-threaded.
    init_logger(&cli.logger_config())?;
    info!("logger initialized");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        match cli.command {
            Command::Serve(args) => serve(args).await,
            Command::Listen(args) => listen(args).await,
            Command::Stop(args) => stop(args).await,
        }
    })
}

async fn serve(args: ServeArgs) -> Result<()> {
    let pipeline = args.pipeline_config();
    pipeline.validate()?;
    let scalar = args.endpoints.scalar();
    scalar.validate()?;
    let atoms = args.endpoints.atoms();
    atoms.validate()?;

    let registry = Arc::new(TaskRegistry::with_task_names());
    let orchestrator = Arc::new(
        Orchestrator::new(registry, EventBus::new(DEFAULT_CAPACITY))
            .with_jobs(JobFactory::new(args.job_config()))
            .with_pipeline(pipeline)
            .with_relays(scalar, atoms)
            .with_control(ControlChannel::new(args.endpoints.control()))
            .with_project_dir(&args.project_dir),
    );
    info!(
        jobs = %args.job_config().root.display(),
        projects = %args.project_dir.display(),
        "orchestrator ready"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutting down..."),
                Err(e) => {
                    warn!(error = %e, "unable to listen for ctrl-c; stop the process by other means");
                    return;
                }
            }
            shutdown.cancel();
        }
    });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "http api listening");

    let app = HttpApi::new(Arc::clone(&orchestrator)).router();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server failed")?;

    orchestrator.stop_listening().await?;
    info!("stopped");
    Ok(())
}

async fn listen(args: ListenArgs) -> Result<()> {
    let cfg = args.relay_config();
    let bus = EventBus::default();
    let mut rx = bus.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ClientEvent::TelemetryScalar { payload } | ClientEvent::TelemetryAtoms { payload }) => {
                    println!("{payload}")
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => warn!(missed, "stdout fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let relay = TelemetryRelay::new(cfg);
    let res = tokio::select! {
        res = relay.run(&bus, None) => res.map(|_| ()).context("telemetry relay stopped"),
        _ = tokio::signal::ctrl_c() => Ok(()),
    };

    drop(bus);
    let _ = printer.await;
    res
}

async fn stop(args: StopArgs) -> Result<()> {
    let channel = ControlChannel::new(args.control_config());
    channel.send_stop_command(&EventBus::default()).await;
    Ok(())
}
