use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use radahn_core::JobConfig;
use radahn_exec::{FailurePolicy, PipelineConfig};
use radahn_observe::{LoggerConfig, LoggerFormat};
use radahn_relay::{ControlConfig, RelayConfig};

#[derive(Debug, Parser)]
#[command(
    name = "radahn-agentd",
    version,
    about = "Runs steered molecular dynamics jobs and relays their telemetry"
)]
pub struct Cli {
    /// Log filter directive
    #[arg(long, env = "RADAHN_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format: text, json or journald
    #[arg(long, env = "RADAHN_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LoggerFormat,

    /// Keep client log-messages out of the agent log
    #[arg(long, global = true)]
    pub mute_client_events: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            client_events: !self.mute_client_events,
            ..LoggerConfig::new(self.log_level.as_str(), self.log_format)
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the command API and the client event stream
    Serve(ServeArgs),
    /// Print one telemetry stream to stdout until interrupted
    Listen(ListenArgs),
    /// Send a single stop command to the running simulation
    Stop(StopArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address the HTTP API binds to
    #[arg(long, env = "RADAHN_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Parent directory of job directories (defaults to the system temp dir)
    #[arg(long, env = "RADAHN_JOB_ROOT")]
    pub job_root: Option<PathBuf>,

    /// Directory where saved projects are written
    #[arg(long, env = "RADAHN_PROJECT_DIR", default_value = "projects")]
    pub project_dir: PathBuf,

    /// Pipeline name, also the transcript prefix
    #[arg(long)]
    pub pipeline_name: Option<String>,

    /// Executable running the workflow description
    #[arg(long, env = "RADAHN_LAUNCHER")]
    pub launcher: Option<String>,

    /// Workflow description handed to the launcher
    #[arg(long, env = "RADAHN_WORKFLOW_SCRIPT")]
    pub workflow_script: Option<PathBuf>,

    /// Shell script produced by the workflow step
    #[arg(long)]
    pub launch_script: Option<String>,

    /// Pipeline polling cadence in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Skip the remaining steps after a failed one
    #[arg(long)]
    pub halt_on_failure: bool,

    #[command(flatten)]
    pub endpoints: Endpoints,
}

impl ServeArgs {
    pub fn job_config(&self) -> JobConfig {
        match &self.job_root {
            Some(root) => JobConfig { root: root.clone() },
            None => JobConfig::default(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        if let Some(name) = &self.pipeline_name {
            cfg.name = name.clone();
        }
        if let Some(launcher) = &self.launcher {
            cfg.launcher = launcher.clone();
        }
        if let Some(script) = &self.workflow_script {
            cfg.workflow_script = script.clone();
        }
        if let Some(script) = &self.launch_script {
            cfg.launch_script = script.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if self.halt_on_failure {
            cfg.failure_policy = FailurePolicy::Halt;
        }
        cfg
    }
}

/// ZeroMQ endpoints of the simulation.
#[derive(Debug, Args)]
pub struct Endpoints {
    /// Scalar telemetry publisher
    #[arg(long, env = "RADAHN_SCALAR_ENDPOINT")]
    pub scalar_endpoint: Option<String>,

    /// Atom position publisher
    #[arg(long, env = "RADAHN_ATOMS_ENDPOINT")]
    pub atoms_endpoint: Option<String>,

    /// Command channel
    #[arg(long, env = "RADAHN_COMMAND_ENDPOINT")]
    pub command_endpoint: Option<String>,
}

impl Endpoints {
    pub fn scalar(&self) -> RelayConfig {
        with_endpoint(RelayConfig::scalar(), self.scalar_endpoint.as_deref())
    }

    pub fn atoms(&self) -> RelayConfig {
        with_endpoint(RelayConfig::atoms(), self.atoms_endpoint.as_deref())
    }

    pub fn control(&self) -> ControlConfig {
        let mut cfg = ControlConfig::default();
        if let Some(endpoint) = &self.command_endpoint {
            cfg.endpoint = endpoint.clone();
        }
        cfg
    }
}

fn with_endpoint(cfg: RelayConfig, endpoint: Option<&str>) -> RelayConfig {
    match endpoint {
        Some(endpoint) => cfg.with_endpoint(endpoint),
        None => cfg,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TelemetryStream {
    Scalar,
    Atoms,
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Which telemetry stream to print
    #[arg(value_enum, default_value_t = TelemetryStream::Scalar)]
    pub stream: TelemetryStream,

    #[command(flatten)]
    pub endpoints: Endpoints,
}

impl ListenArgs {
    pub fn relay_config(&self) -> RelayConfig {
        match self.stream {
            TelemetryStream::Scalar => self.endpoints.scalar(),
            TelemetryStream::Atoms => self.endpoints.atoms(),
        }
    }
}

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Give up on an unreachable simulation after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(flatten)]
    pub endpoints: Endpoints,
}

impl StopArgs {
    pub fn control_config(&self) -> ControlConfig {
        let mut cfg = self.endpoints.control();
        if let Some(ms) = self.timeout_ms {
            cfg.timeout = Duration::from_millis(ms);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use radahn_relay::TelemetryKind;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_overrides_pipeline_defaults() {
        let cli = Cli::try_parse_from([
            "radahn-agentd",
            "serve",
            "--launcher",
            "python3.12",
            "--poll-interval-ms",
            "250",
            "--halt-on-failure",
            "--scalar-endpoint",
            "tcp://sim:6000",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        let pipeline = args.pipeline_config();
        assert_eq!(pipeline.launcher, "python3.12");
        assert_eq!(pipeline.name, "lammpsSteered");
        assert_eq!(pipeline.poll_interval, Duration::from_millis(250));
        assert_eq!(pipeline.failure_policy, FailurePolicy::Halt);
        assert_eq!(args.endpoints.scalar().endpoint, "tcp://sim:6000");
        assert_eq!(args.endpoints.atoms().endpoint, RelayConfig::atoms().endpoint);
    }

    #[test]
    fn listen_selects_stream() {
        let cli = Cli::try_parse_from(["radahn-agentd", "listen", "atoms"]).unwrap();
        let Command::Listen(args) = cli.command else {
            panic!("expected listen");
        };
        assert_eq!(args.relay_config().kind, TelemetryKind::Atoms);
    }

    #[test]
    fn global_log_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["radahn-agentd", "stop", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LoggerFormat::Json);
        assert!(cli.logger_config().client_events);
    }

    #[test]
    fn unknown_log_format_rejected() {
        assert!(Cli::try_parse_from(["radahn-agentd", "--log-format", "xml", "stop"]).is_err());
    }
}
