#![doc = "The `productforge` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, authentication, routing and error handling"]
#![doc = "for the products catalog service. The binary (`main.rs`) wires them into an"]
#![doc = "actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
