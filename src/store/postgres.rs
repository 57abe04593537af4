use std::time::Duration;

use async_trait::async_trait;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ProductStore, StoreError, UserStore, DUPLICATE_EMAIL, DUPLICATE_PRODUCT_CODE};
use crate::models::{NewUser, Product, ProductPatch, ProductQuery, User, UserChanges};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const PRODUCT_COLUMNS: &str =
    "id, product_code, name, description, version, price, qty, date_added, updated_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Turns a unique-key violation into `StoreError::Duplicate` with the given message.
fn map_unique(error: sqlx::Error, duplicate_message: &str) -> StoreError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(duplicate_message.to_string())
        }
        _ => StoreError::Database(error),
    }
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.product_code)
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.version)
            .bind(product.price)
            .bind(product.qty)
            .bind(product.date_added)
            .bind(product.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, DUPLICATE_PRODUCT_CODE))
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let products = match search {
            Some(term) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE name ILIKE $1 OR product_code ILIKE $1 \
                     ORDER BY date_added DESC"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(format!("%{}%", escape_like(term)))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY date_added DESC");
                sqlx::query_as::<_, Product>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(products)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        // Nullable columns carry a presence flag so `null` can clear them.
        let set_description = patch.description.is_some();
        let set_version = patch.version.is_some();
        let sql = format!(
            "UPDATE products SET \
               product_code = COALESCE($2, product_code), \
               name = COALESCE($3, name), \
               description = CASE WHEN $9 THEN $4 ELSE description END, \
               version = CASE WHEN $10 THEN $5 ELSE version END, \
               price = COALESCE($6, price), \
               qty = COALESCE($7, qty), \
               date_added = COALESCE($8, date_added), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(patch.product_code)
            .bind(patch.name)
            .bind(patch.description.flatten())
            .bind(patch.version.flatten())
            .bind(patch.price)
            .bind(patch.qty)
            .bind(patch.date_added)
            .bind(set_description)
            .bind(set_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, DUPLICATE_PRODUCT_CODE))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User::new(user);
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, DUPLICATE_EMAIL))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET \
               username = COALESCE($2, username), \
               email = COALESCE($3, email), \
               password_hash = COALESCE($4, password_hash), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, DUPLICATE_EMAIL))
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
