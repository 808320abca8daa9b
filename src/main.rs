use tracing::{error, info};

use fxchat::{ChatServer, Config};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = fxchat::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        fxchat::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("fxchat - currency chat hub");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let server = match ChatServer::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Goodbye");
}
