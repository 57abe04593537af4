use std::sync::Arc;

use crate::auth::TokenService;
use crate::store::{MemoryProductStore, MemoryUserStore, ProductStore, UserStore};

/// Shared handles every handler can reach through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
        tokens: TokenService,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            products,
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// State backed by empty in-memory stores.
    pub fn in_memory(tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self::new(
            Arc::new(MemoryProductStore::default()),
            Arc::new(MemoryUserStore::default()),
            tokens,
            bcrypt_cost,
        )
    }
}
