use std::process::ExitCode;

use tracing::{error, info};

use fileman::{ActionEngine, Config, Root, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = fileman::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        fileman::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let root = match Root::new(&config.files.root) {
        Ok(root) => root,
        Err(e) => {
            error!("Cannot use {} as root: {}", config.files.root, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Managing {}", root.base_path().display());

    let engine = ActionEngine::new(root, config.files.policy());
    let server = match WebServer::new(&config.server, engine, config.files.show_space) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
