use tracing::{error, info};

use bytebucket::web::WebServer;
use bytebucket::{BlobStore, Config, Database};

#[tokio::main]
async fn main() {
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
    if let Err(e) = bytebucket::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        bytebucket::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> bytebucket::Result<()> {
    config.validate()?;
    info!("ByteBucket starting");

    let db = Database::open(&config.database.path).await?;

    let storage = BlobStore::new(&config.storage.path);
    storage.initialize()?;
    info!("Blob storage initialized at: {}", config.storage.path);

    WebServer::new(&config.server, &config.storage, db, storage)?
        .run()
        .await
}
