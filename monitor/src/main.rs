//! Mokamon - Entry Point
//!
//! Watches the production hub and serves the live machine roster and
//! per-factory aggregates of the factory dashboard.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use mokamon::app::options::AppOptions;
use mokamon::app::run::{observe_once, run};
use mokamon::commands::{BackendCommand, BACKEND_KEYS};
use mokamon::filesys::file::File;
use mokamon::http::client::HttpClient;
use mokamon::hub::websocket::WsConnector;
use mokamon::logs::{init_logging, LogLevel, LogOptions};
use mokamon::report::render_status;
use mokamon::storage::layout::StorageLayout;
use mokamon::storage::settings::Settings;
use mokamon::utils::version_info;

use tracing::{error, info};

const DEFAULT_WATCH_SECS: u64 = 10;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", version.version),
        }
        return;
    }

    let layout = StorageLayout::default();
    let settings_file = match cli_args.get("config") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };

    // Write a default settings file and exit
    if cli_args.contains_key("init") {
        if settings_file.exists().await {
            eprintln!(
                "Settings file already exists: {}",
                settings_file.path().display()
            );
            return;
        }
        match settings_file.write_json(&Settings::default()).await {
            Ok(()) => println!("Settings written to {}", settings_file.path().display()),
            Err(e) => eprintln!("Unable to write settings file: {e}"),
        }
        return;
    }

    let settings = match Settings::load(&settings_file).await {
        Ok(settings) => settings.with_env_overrides(),
        Err(e) => {
            eprintln!(
                "Unable to read settings file {}: {e}",
                settings_file.path().display()
            );
            return;
        }
    };

    let one_shot = cli_args.contains_key("status")
        || BACKEND_KEYS.iter().any(|key| cli_args.contains_key(*key));

    // Initialize logging
    let log_options = LogOptions {
        log_level: if one_shot {
            LogLevel::Warn
        } else {
            settings.log_level.clone()
        },
        log_dir: cli_args
            .contains_key("log-file")
            .then(|| layout.logs_dir()),
        json_format: cli_args.contains_key("json-logs"),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = match AppOptions::from_settings(&settings) {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid settings: {e}");
            return;
        }
    };

    let body = match cli_args.get("body") {
        Some(path) => match File::new(path).read_string().await {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Unable to read request body {}: {e}", path);
                return;
            }
        },
        None => None,
    };
    match BackendCommand::from_args(&cli_args, body.as_deref()) {
        Ok(Some(command)) => return run_backend_command(&options, &command).await,
        Ok(None) => {}
        Err(e) => {
            error!("Invalid command: {e}");
            return;
        }
    }

    if cli_args.contains_key("status") {
        let watch_secs = cli_args
            .get("watch-secs")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_WATCH_SECS);
        return print_status(&options, Duration::from_secs(watch_secs)).await;
    }

    info!("Running mokamon {} with options: {:?}", version.version, options);
    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Failed to run the monitor: {e}");
    }
}

async fn print_status(options: &AppOptions, watch: Duration) {
    let connector = match WsConnector::new(options.hub.clone()) {
        Ok(connector) => Arc::new(connector),
        Err(e) => {
            error!("Unable to create hub connector: {e}");
            return;
        }
    };

    match observe_once(options, connector, watch).await {
        Ok(observation) => print!(
            "{}",
            render_status(
                &observation.state.roster.snapshot(),
                &options.factories,
                observation.connection,
            )
        ),
        Err(e) => error!("Status collection failed: {e}"),
    }
}

async fn run_backend_command(options: &AppOptions, command: &BackendCommand) {
    let client = match HttpClient::new(&options.backend_base_url) {
        Ok(client) => client,
        Err(e) => {
            error!("Unable to create HTTP client: {e}");
            return;
        }
    };

    match command.execute(&client).await {
        Ok(output) => print!("{}", output),
        Err(e) => error!("Backend command failed: {e}"),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
