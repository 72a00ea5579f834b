use std::path::Path;

use super::*;
use crate::domain::types::ExportFormat;

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:8001");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(settings.compile.typst_cli_path, Path::new("typst"));
    assert_eq!(settings.compile.timeout, Duration::from_secs(30));
    assert!(settings.compile.scratch_dir.ends_with("typst_editor"));
    assert_eq!(settings.compile.page_pattern, "page{p}.svg");
    assert!(settings.cors.allows_any_origin());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.compile.timeout_seconds = Some(10);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        compile: CompileOverrides {
            timeout_seconds: Some(5),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.compile.timeout, Duration::from_secs(5));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        logging: LoggingOverrides {
            log_json: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_compile_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.compile.timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "compile.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn page_pattern_requires_placeholder_and_svg_suffix() {
    for pattern in ["page.svg", "page{p}.png", "pages/page{p}.svg", "page{n}.svg"] {
        let mut raw = RawSettings::default();
        raw.compile.page_pattern = Some(pattern.to_string());
        let err = Settings::from_raw(raw).expect_err(pattern);
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "compile.page_pattern",
                ..
            }
        ));
    }

    for pattern in ["page{p}.svg", "p-{0p}.svg", "page{p}-of-{t}.svg"] {
        let mut raw = RawSettings::default();
        raw.compile.page_pattern = Some(pattern.to_string());
        assert!(Settings::from_raw(raw).is_ok(), "{pattern} rejected");
    }
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url, None);
}

#[test]
fn cors_origins_can_be_restricted() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cors_allowed_origins: Some(vec![
            "http://localhost:3000".to_string(),
            " ".to_string(),
        ]),
        ..Default::default()
    };
    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3000"]);
    assert!(!settings.cors.allows_any_origin());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["rapid-typst"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "rapid-typst",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cors-allowed-origins",
        "http://a.test,http://b.test",
        "--typst-cli-path",
        "/opt/typst/bin/typst",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(
                serve.overrides.cors_allowed_origins,
                Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
            );
            assert_eq!(
                serve.overrides.compile.typst_cli_path.as_deref(),
                Some(Path::new("/opt/typst/bin/typst"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_export_arguments() {
    let args = CliArgs::parse_from([
        "rapid-typst",
        "export",
        "--format",
        "docx",
        "--compile-timeout-seconds",
        "12",
        "/tmp/notes.typ",
    ]);

    match args.command.expect("export command") {
        Command::Export(export) => {
            assert_eq!(export.format, ExportFormat::Docx);
            assert_eq!(export.compile.timeout_seconds, Some(12));
            assert_eq!(export.input, Path::new("/tmp/notes.typ"));
            assert_eq!(export.output_path(), Path::new("/tmp/notes.docx"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn export_defaults_to_pdf() {
    let args = CliArgs::parse_from(["rapid-typst", "export", "in.typ", "-o", "out.pdf"]);
    match args.command.expect("export command") {
        Command::Export(export) => {
            assert_eq!(export.format, ExportFormat::Pdf);
            assert_eq!(export.output_path(), Path::new("out.pdf"));
        }
        _ => panic!("wrong command parsed"),
    }
}
