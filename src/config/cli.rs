use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::types::ExportFormat;

/// Command-line arguments for the rapid-typst binary.
#[derive(Debug, Parser)]
#[command(
    name = "rapid-typst",
    version,
    about = "Typst editor backend: live preview, export and document storage"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RAPID_TYPST_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Compile a Typst file to PDF, HTML, DOCX or SVG without starting the server.
    Export(ExportArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
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
pub struct CompileOverrides {
    /// Override the Typst CLI executable used for SVG page rendering.
    #[arg(long = "typst-cli-path", value_name = "PATH")]
    pub typst_cli_path: Option<PathBuf>,

    /// Override the per-compile wall-clock timeout.
    #[arg(long = "compile-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the scratch directory for compile jobs.
    #[arg(long = "compile-scratch-dir", value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Override the per-page output file name pattern passed to Typst.
    #[arg(long = "compile-page-pattern", value_name = "PATTERN")]
    pub page_pattern: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub compile: CompileOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the allowed CORS origins (comma separated, `*` for any).
    #[arg(long = "cors-allowed-origins", value_name = "ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub compile: CompileOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Output format.
    #[arg(long, short = 'f', default_value = "pdf", value_name = "FORMAT")]
    pub format: ExportFormat,

    /// Typst source file to compile.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination file; defaults to the input path with the format's extension.
    #[arg(long, short = 'o', value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(self.format.as_str()))
    }
}
