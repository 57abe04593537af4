use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info, warn};

use productforge::{
    auth::TokenService,
    config::Config,
    routes::{self, health},
    store::{postgres, PgProductStore, PgUserStore},
    AppState,
};

async fn build_state(config: &Config) -> std::io::Result<AppState> {
    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl());

    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, products and users are kept in memory only");
        return Ok(AppState::in_memory(tokens, config.bcrypt_cost));
    };

    let pool = postgres::connect(database_url, config.database_max_connections)
        .await
        .map_err(|e| {
            error!("failed to connect to database: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
        })?;
    postgres::run_migrations(&pool).await.map_err(|e| {
        error!("failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;
    info!("connected to database, migrations applied");

    Ok(AppState::new(
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::new(PgUserStore::new(pool)),
        tokens,
        config.bcrypt_cost,
    ))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let state = web::Data::new(build_state(&config).await?);

    info!("Starting productforge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
