//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, CompileOverrides, ExportArgs, LoggingOverrides, ServeArgs, ServeOverrides,
};

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::compile::DEFAULT_PAGE_PATTERN;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rapid-typst";
const ENV_PREFIX: &str = "RAPID_TYPST";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCRATCH_DIR_NAME: &str = "typst_editor";
const DEFAULT_TYPST_CLI_PATH: &str = "typst";
const PAGE_NUMBER_PLACEHOLDERS: [&str; 3] = ["{p}", "{0p}", "{t}"];

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub compile: CompileSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
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

#[derive(Debug, Clone)]
pub struct CompileSettings {
    pub typst_cli_path: PathBuf,
    pub timeout: Duration,
    pub scratch_dir: PathBuf,
    pub page_pattern: String,
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
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

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Export(args)) => {
            raw.apply_logging_overrides(&args.logging);
            raw.apply_compile_overrides(&args.compile);
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    compile: RawCompileSettings,
    cors: RawCorsSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(origins) = overrides.cors_allowed_origins.as_ref() {
            self.cors.allowed_origins = Some(origins.clone());
        }

        self.apply_logging_overrides(&overrides.logging);
        self.apply_compile_overrides(&overrides.compile);
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_compile_overrides(&mut self, overrides: &CompileOverrides) {
        if let Some(path) = overrides.typst_cli_path.as_ref() {
            self.compile.typst_cli_path = Some(path.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.compile.timeout_seconds = Some(seconds);
        }
        if let Some(dir) = overrides.scratch_dir.as_ref() {
            self.compile.scratch_dir = Some(dir.clone());
        }
        if let Some(pattern) = overrides.page_pattern.as_ref() {
            self.compile.page_pattern = Some(pattern.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            compile,
            cors,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            compile: build_compile_settings(compile)?,
            cors: build_cors_settings(cors)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
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

fn build_compile_settings(compile: RawCompileSettings) -> Result<CompileSettings, LoadError> {
    let typst_cli_path = compile
        .typst_cli_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TYPST_CLI_PATH));
    if typst_cli_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "compile.typst_cli_path",
            "path must not be empty",
        ));
    }

    let timeout_seconds = compile
        .timeout_seconds
        .unwrap_or(DEFAULT_COMPILE_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "compile.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let scratch_dir = compile
        .scratch_dir
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME));
    if scratch_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "compile.scratch_dir",
            "path must not be empty",
        ));
    }

    let page_pattern = compile
        .page_pattern
        .unwrap_or_else(|| DEFAULT_PAGE_PATTERN.to_string());
    validate_page_pattern(&page_pattern)
        .map_err(|reason| LoadError::invalid("compile.page_pattern", reason))?;

    Ok(CompileSettings {
        typst_cli_path,
        timeout: Duration::from_secs(timeout_seconds),
        scratch_dir,
        page_pattern,
    })
}

fn validate_page_pattern(pattern: &str) -> Result<(), String> {
    if !PAGE_NUMBER_PLACEHOLDERS
        .iter()
        .any(|placeholder| pattern.contains(placeholder))
    {
        return Err(format!(
            "`{pattern}` must contain a page number placeholder ({})",
            PAGE_NUMBER_PLACEHOLDERS.join(", ")
        ));
    }
    if !pattern.ends_with(".svg") {
        return Err(format!("`{pattern}` must end with `.svg`"));
    }
    if pattern.contains('/') || pattern.contains('\\') {
        return Err(format!("`{pattern}` must be a file name, not a path"));
    }
    Ok(())
}

fn build_cors_settings(cors: RawCorsSettings) -> Result<CorsSettings, LoadError> {
    let allowed_origins: Vec<String> = cors
        .allowed_origins
        .unwrap_or_else(|| vec!["*".to_string()])
        .into_iter()
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();
    if allowed_origins.is_empty() {
        return Err(LoadError::invalid(
            "cors.allowed_origins",
            "at least one origin is required",
        ));
    }

    Ok(CorsSettings { allowed_origins })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
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
struct RawCompileSettings {
    typst_cli_path: Option<PathBuf>,
    timeout_seconds: Option<u64>,
    scratch_dir: Option<PathBuf>,
    page_pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCorsSettings {
    allowed_origins: Option<Vec<String>>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
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

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
