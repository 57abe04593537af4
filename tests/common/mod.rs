#![allow(dead_code)]

use actix_web::web;
use chrono::Duration;
use productforge::{auth::TokenService, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Fresh in-memory state; bcrypt runs at its minimum cost to keep tests quick.
pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(
        TokenService::new(JWT_SECRET, Duration::hours(1)),
        4,
    ))
}

/// Builds the same service tree as `main.rs` around the given state.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .wrap(actix_web::middleware::Logger::default())
                .service(productforge::routes::health::health)
                .service(actix_web::web::scope("/api").configure(productforge::routes::config)),
        )
        .await
    };
}
