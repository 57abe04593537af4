use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProductStore, StoreError, UserStore, DUPLICATE_EMAIL, DUPLICATE_PRODUCT_CODE};
use crate::models::{NewUser, Product, ProductPatch, ProductQuery, User, UserChanges};

#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<Uuid, Product>>,
}

fn code_taken(products: &HashMap<Uuid, Product>, code: &str, except: Option<Uuid>) -> bool {
    products
        .values()
        .any(|p| p.product_code == code && Some(p.id) != except)
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut products = self.products.write().await;
        if code_taken(&products, &product.product_code, None) {
            return Err(StoreError::Duplicate(DUPLICATE_PRODUCT_CODE.into()));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .values()
            .filter(|p| p.matches(query))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(found)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().await;
        if !products.contains_key(&id) {
            return Ok(None);
        }
        if let Some(code) = patch.product_code.as_deref() {
            if code_taken(&products, code, Some(id)) {
                return Err(StoreError::Duplicate(DUPLICATE_PRODUCT_CODE.into()));
            }
        }
        Ok(products.get_mut(&id).map(|product| {
            product.apply(patch);
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        Ok(products.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

// Unicode lowercasing, as the unique index on `LOWER(email)` does.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| same_email(&u.email, email) && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &new_user.email, None) {
            return Err(StoreError::Duplicate(DUPLICATE_EMAIL.into()));
        }
        let user = User::new(new_user);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = changes.email.as_deref() {
            if email_taken(&users, email, Some(id)) {
                return Err(StoreError::Duplicate(DUPLICATE_EMAIL.into()));
            }
        }
        Ok(users.get_mut(&id).map(|user| {
            user.apply(changes);
            user.clone()
        }))
    }
}
