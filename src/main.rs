use std::{net::SocketAddr, sync::Arc};

use log::{error, info};

use config::Config;
use model::{AppState, Database};

mod accounts;
mod auth;
mod config;
mod logger;
mod model;
mod routes;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error("invalid server address {0}")]
    Address(String),

    #[error("failed to open database: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Hasher(#[from] auth::hash::Error),

    #[error("failed to create seed account: {0}")]
    Seed(#[from] accounts::Error),

    #[error("server error: {0}")]
    Server(String),
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = logger::init(config.log.level) {
        eprintln!("Failed to initialize logger: {}", err);
    }

    if let Err(err) = run(config).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let address: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|_| StartupError::Address(config.server.address.clone()))?;

    let database = Database::open(&config.database.path)?;
    let hasher = auth::hash::Hasher::new(&config.security)?;
    let state = Arc::new(AppState::new(
        Box::new(database),
        hasher,
        auth::token::os_rng(),
        config.server.strict_status_codes,
    ));

    if config.seed.enabled {
        let id = accounts::ensure_seed_account(&state, &config.seed.username, &config.seed.password)
            .await?;
        info!("Seed account {} ready (user {})", config.seed.username, id);
    }

    let app = routes::router(state, config.server.request_timeout());

    info!("Starting porter server at {}", address);

    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await
        .map_err(|err| StartupError::Server(err.to_string()))?;

    Ok(())
}
