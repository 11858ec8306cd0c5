use livemark::{
    arguments::{get_config_path, is_help_requested, print_help},
    config,
    logger::{self, LogTag},
};

/// Entry point for the livemark server
#[tokio::main]
async fn main() {
    #[cfg(feature = "logging")]
    {
        // Missing .env is normal outside development
        let _ = dotenv::dotenv();
    }

    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    let config_path = get_config_path().unwrap_or_else(|| config::CONFIG_FILE_PATH.to_string());
    if let Err(e) = config::load_config_from_path(&config_path) {
        logger::error(LogTag::Config, &format!("Configuration error: {}", e));
        std::process::exit(1);
    }

    match livemark::run::run_server().await {
        Ok(()) => logger::info(LogTag::System, "livemark stopped"),
        Err(e) => {
            logger::error(LogTag::System, &format!("livemark failed: {}", e));
            std::process::exit(1);
        }
    }
}
