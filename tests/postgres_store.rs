//! Store tests against a live Postgres. Each test returns early when
//! `DATABASE_URL` is unset, so the suite still passes without a database.

use chrono::{Duration, Utc};
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use productforge::models::{NewUser, Product, ProductInput, ProductPatch, ProductQuery, UserChanges};
use productforge::store::{
    postgres, PgProductStore, PgUserStore, ProductStore, StoreError, UserStore,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };
    let pool = postgres::connect(&database_url, 2)
        .await
        .expect("Failed to connect to database");
    postgres::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

/// Short per-test marker keeping codes and emails unique across parallel tests.
fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn product(code: &str, name: &str) -> Product {
    Product::new(ProductInput {
        product_code: code.to_string(),
        name: name.to_string(),
        description: Some("Stock item".to_string()),
        version: Some("v1".to_string()),
        price: 10.0,
        qty: Some(3),
        date_added: None,
    })
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
    }
}

async fn cleanup_products(store: &PgProductStore, ids: &[Uuid]) {
    for id in ids {
        let _ = store.delete(*id).await;
    }
}

async fn cleanup_users(pool: &PgPool, ids: &[Uuid]) {
    let _ = sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await;
}

#[actix_rt::test]
async fn test_migrations_are_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };
    postgres::run_migrations(&pool)
        .await
        .expect("Second migration run should be a no-op");
}

#[actix_rt::test]
async fn test_pg_insert_rejects_duplicate_code() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgProductStore::new(pool);
    let code = format!("DUP-{}", tag());

    let saved = store.insert(product(&code, "First")).await.unwrap();
    assert_eq!(saved.product_code, code);
    assert_eq!(saved.qty, 3);

    let err = store.insert(product(&code, "Second")).await.unwrap_err();
    assert!(
        matches!(err, StoreError::Duplicate(ref m) if m == "Product code already exists"),
        "unexpected error: {:?}",
        err
    );

    cleanup_products(&store, &[saved.id]).await;
}

#[actix_rt::test]
async fn test_pg_update_keeps_own_code_and_rejects_clash() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgProductStore::new(pool);
    let tag = tag();
    let keep = store
        .insert(product(&format!("KEEP-{}", tag), "Keeper"))
        .await
        .unwrap();
    let other = store
        .insert(product(&format!("OTHER-{}", tag), "Other"))
        .await
        .unwrap();

    let patch = ProductPatch {
        product_code: Some(keep.product_code.clone()),
        ..Default::default()
    };
    assert!(store.update(keep.id, patch).await.unwrap().is_some());

    let clash = ProductPatch {
        product_code: Some(other.product_code.clone()),
        ..Default::default()
    };
    assert!(matches!(
        store.update(keep.id, clash).await,
        Err(StoreError::Duplicate(_))
    ));

    cleanup_products(&store, &[keep.id, other.id]).await;
}

#[actix_rt::test]
async fn test_pg_partial_update_and_null_clear() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgProductStore::new(pool);
    let saved = store
        .insert(product(&format!("PATCH-{}", tag()), "Lamp"))
        .await
        .unwrap();

    let updated = store
        .update(
            saved.id,
            ProductPatch {
                price: Some(12.5),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("product exists");
    assert_eq!(updated.price, 12.5);
    assert_eq!(updated.name, "Lamp");
    assert_eq!(updated.qty, 3);
    assert_eq!(updated.description.as_deref(), Some("Stock item"));
    assert_eq!(updated.version.as_deref(), Some("v1"));

    let cleared = store
        .update(
            saved.id,
            ProductPatch {
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("product exists");
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.version.as_deref(), Some("v1"));
    assert_eq!(cleared.price, 12.5);

    cleanup_products(&store, &[saved.id]).await;
}

#[actix_rt::test]
async fn test_pg_list_search_escapes_wildcards_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgProductStore::new(pool);
    let tag = tag();

    let mut older = product(&format!("OLD-{}", tag), &format!("{} 50% lamp", tag));
    older.date_added = Utc::now() - Duration::days(2);
    let older = store.insert(older).await.unwrap();
    let newer = store
        .insert(product(
            &format!("NEW-{}", tag),
            &format!("{} 50% lamp deluxe", tag),
        ))
        .await
        .unwrap();
    let decoy = store
        .insert(product(&format!("DECOY-{}", tag), &format!("{} 500 lamp", tag)))
        .await
        .unwrap();

    let found = store
        .list(&ProductQuery {
            search: Some(format!("{} 50%", tag.to_lowercase())),
        })
        .await
        .unwrap();
    let codes: Vec<_> = found.iter().map(|p| p.product_code.clone()).collect();
    assert_eq!(codes, vec![newer.product_code.clone(), older.product_code.clone()]);

    // The code column is searched too.
    let found = store
        .list(&ProductQuery {
            search: Some(format!("decoy-{}", tag.to_lowercase())),
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, decoy.id);

    cleanup_products(&store, &[older.id, newer.id, decoy.id]).await;
}

#[actix_rt::test]
async fn test_pg_update_and_delete_missing_product() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgProductStore::new(pool);
    let missing = Uuid::new_v4();

    assert!(store
        .update(missing, ProductPatch::default())
        .await
        .unwrap()
        .is_none());
    assert!(store.find(missing).await.unwrap().is_none());
    assert!(!store.delete(missing).await.unwrap());

    let saved = store
        .insert(product(&format!("DEL-{}", tag()), "Doomed"))
        .await
        .unwrap();
    assert!(store.delete(saved.id).await.unwrap());
    assert!(!store.delete(saved.id).await.unwrap());
}

#[actix_rt::test]
async fn test_pg_user_email_unique_case_insensitive() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgUserStore::new(pool.clone());
    let tag = tag().to_lowercase();
    let email = format!("user-{}@example.com", tag);

    let alice = store.insert(new_user("alice", &email)).await.unwrap();

    let err = store
        .insert(new_user("alice2", &email.to_uppercase()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Duplicate(ref m) if m == "Email already registered"),
        "unexpected error: {:?}",
        err
    );

    let found = store.find_by_email(&email.to_uppercase()).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(alice.id));

    let bob = store
        .insert(new_user("bob", &format!("bob-{}@example.com", tag)))
        .await
        .unwrap();
    let clash = UserChanges {
        email: Some(email.to_uppercase()),
        ..Default::default()
    };
    assert!(matches!(
        store.update(bob.id, clash).await,
        Err(StoreError::Duplicate(_))
    ));

    let renamed = store
        .update(
            bob.id,
            UserChanges {
                username: Some("robert".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(renamed.username, "robert");
    assert_eq!(renamed.email, bob.email);

    assert!(store
        .update(Uuid::new_v4(), UserChanges::default())
        .await
        .unwrap()
        .is_none());

    cleanup_users(&pool, &[alice.id, bob.id]).await;
}
