use crate::{
    error::AppError,
    models::{Product, ProductInput, ProductPatch, ProductQuery},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

const NOT_FOUND: &str = "Product not found";

/// Lists products, newest first.
///
/// ## Query Parameters:
/// - `search` (optional): case-insensitive match against the product name or code.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Product` objects.
/// - `500 Internal Server Error`: storage failure.
#[get("")]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<impl Responder, AppError> {
    let products = state.products.list(&query).await?;
    Ok(HttpResponse::Ok().json(products))
}

/// Adds a product to the catalog.
///
/// ## Responses:
/// - `201 Created`: the stored `Product`, including its generated `id`.
/// - `400 Bad Request`: malformed JSON, or the `product_code` is already used.
/// - `422 Unprocessable Entity`: a field breaks the schema (negative price, bad code, ...).
#[post("")]
pub async fn create_product(
    state: web::Data<AppState>,
    input: web::Json<ProductInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;

    let product = state
        .products
        .insert(Product::new(input.into_inner()))
        .await?;
    log::info!("product {} created ({})", product.id, product.product_code);

    Ok(HttpResponse::Created().json(product))
}

#[get("/{id}")]
pub async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    match state.products.find(id.into_inner()).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound(NOT_FOUND.into())),
    }
}

/// Updates the fields present in the body and returns the updated product.
///
/// Absent fields are left alone. `"description": null` and `"version": null` clear them.
///
/// ## Responses:
/// - `200 OK`: the updated `Product`.
/// - `400 Bad Request`: malformed JSON or id, or the new `product_code` is taken.
/// - `404 Not Found`: no product with that id.
/// - `422 Unprocessable Entity`: a present field breaks the schema.
#[put("/{id}")]
pub async fn update_product(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    patch: web::Json<ProductPatch>,
) -> Result<impl Responder, AppError> {
    patch.validate()?;

    match state
        .products
        .update(id.into_inner(), patch.into_inner())
        .await?
    {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound(NOT_FOUND.into())),
    }
}

#[delete("/{id}")]
pub async fn delete_product(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    if !state.products.delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    log::info!("product {} deleted", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}
