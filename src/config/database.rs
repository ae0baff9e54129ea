//! Database configuration module for the marketplace.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. On top of the generated tables it adds
//! the unique `(product_id, author_id)` index that backs the one-review-per-author rule.

use crate::entities::{Product, Review, User, review};
use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, sea_query::Index};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Default location of the `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/tcg_marketplace.sqlite?mode=rwc";

/// Name of the index enforcing one review per author and product.
pub const REVIEW_AUTHOR_INDEX: &str = "idx_reviews_product_author";

/// Creates the directory holding a file-backed `SQLite` database if it is missing.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database at `database_url`.
///
/// # Errors
/// Returns an error if the data directory cannot be created or the connection fails.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if database_url.trim().is_empty() {
        return Err(Error::Config {
            message: "DATABASE_URL is empty".to_string(),
        });
    }
    ensure_parent_dir(database_url)?;
    let db = Database::connect(database_url).await?;
    info!("Database connection opened");
    Ok(db)
}

/// Creates all tables (if they do not exist yet) plus the review uniqueness index.
///
/// Reviews reference products with `ON DELETE CASCADE`; users are referenced by ID only.
///
/// # Errors
/// Returns an error if any DDL statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User).if_not_exists().to_owned();
    let product_table = schema.create_table_from_entity(Product).if_not_exists().to_owned();
    let review_table = schema.create_table_from_entity(Review).if_not_exists().to_owned();

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&review_table)).await?;

    let review_author_index = Index::create()
        .name(REVIEW_AUTHOR_INDEX)
        .table(Review)
        .col(review::Column::ProductId)
        .col(review::Column::AuthorId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&review_author_index)).await?;

    debug!("Tables ensured");
    Ok(())
}
