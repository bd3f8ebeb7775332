use anyhow::Result;
use log::{error, info};
use std::time::Instant;

use nmta_backend::build_rocket;
use nmta_backend::config::AppConfig;
use nmta_backend::database::Store;
use nmta_backend::database::seed::seed_from_dir;
use nmta_backend::mail::Mailer;
use nmta_backend::setup::{initialize_folder, initialize_logger};

#[rocket::main]
async fn main() -> Result<()> {
    initialize_logger();

    let config = AppConfig::load()?;
    initialize_folder(&config)?;

    let start_time = Instant::now();
    let store = Store::open(&config.database_path)?;
    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Opened database {}",
        config.database_path.display()
    );

    if let Some(seed_dir) = &config.seed_dir {
        let seeded = seed_from_dir(&store, seed_dir)?;
        info!("Seeded {} records from {}", seeded, seed_dir.display());
    }

    let mailer = Mailer::from_config(&config)?;

    info!("Listening on {}:{}", config.address, config.port);
    if let Err(e) = build_rocket(config, store, mailer).launch().await {
        error!("Rocket server failed: {}", e);
        return Err(anyhow::Error::from(e));
    }
    Ok(())
}
