pub mod auth;
pub mod health;
pub mod products;
pub mod users;

use actix_web::{error, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Mounts the API routes. Expected to be configured under `/api` with an
/// [`AppState`](crate::state::AppState) in app data.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/products")
                .service(products::list_products)
                .service(products::create_product)
                .service(products::get_product)
                .service(products::update_product)
                .service(products::delete_product),
        )
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register),
        )
        .service(
            web::scope("/users")
                .wrap(AuthMiddleware)
                .service(users::get_profile)
                .service(users::update_profile),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid id".into()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}
