use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    // Product codes: alphanumeric, underscores, hyphens
    static ref PRODUCT_CODE_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Input structure for creating a product.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    /// Catalog code, unique across products.
    #[validate(
        length(min = 1, max = 32),
        regex(
            path = "PRODUCT_CODE_REGEX",
            message = "Product code must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub product_code: String,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub version: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    /// Units in stock. Defaults to 0.
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub qty: Option<i32>,

    /// Defaults to the time of creation.
    pub date_added: Option<DateTime<Utc>>,
}

/// Partial update of a product. Fields left out keep their stored value.
///
/// `description` and `version` are nullable: an explicit `null` clears them.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ProductPatch {
    #[validate(
        length(min = 1, max = 32),
        regex(
            path = "PRODUCT_CODE_REGEX",
            message = "Product code must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub product_code: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 50))]
    pub version: Option<Option<String>>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub qty: Option<i32>,

    pub date_added: Option<DateTime<Utc>>,
}

/// Marks a field as present even when its value is `null`.
/// Absent fields fall back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A product as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub product_code: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub price: f64,
    pub qty: i32,
    pub date_added: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted when listing products.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive match against the name or the product code.
    pub search: Option<String>,
}

impl Product {
    pub fn new(input: ProductInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product_code: input.product_code,
            name: input.name,
            description: input.description,
            version: input.version,
            price: input.price,
            qty: input.qty.unwrap_or(0),
            date_added: input.date_added.unwrap_or(now),
            updated_at: now,
        }
    }

    /// Merges the fields present in `patch` and bumps `updated_at`.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(product_code) = patch.product_code {
            self.product_code = product_code;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(qty) = patch.qty {
            self.qty = qty;
        }
        if let Some(date_added) = patch.date_added {
            self.date_added = date_added;
        }
        self.updated_at = Utc::now();
    }

    pub fn matches(&self, query: &ProductQuery) -> bool {
        match query.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                self.name.to_lowercase().contains(&term)
                    || self.product_code.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}
