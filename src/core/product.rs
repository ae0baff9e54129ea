//! Product business logic - Handles listing, lookup and seller-side management of products.
//!
//! Products are trading-card listings owned by the user who created them. Their `rating`
//! and `review_count` fields belong to the review subsystem (see [`crate::core::review`])
//! and are never written from here; a patch that tries to set them is rejected during
//! deserialization. All functions are async and return Result types for proper error
//! handling throughout the system.

use crate::{
    core::{
        access::Actor,
        pagination::{PageMeta, PageRequest},
        validation,
    },
    entities::{
        Product, Review, product,
        product::{Category, Condition},
        review,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tracing::{info, instrument, warn};

/// Fields of a new listing.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductDraft {
    /// Listing title, 3 to 255 characters
    pub name: String,
    /// Image reference
    pub image: String,
    /// Description, 3 to 1000 characters
    pub description: String,
    /// Optional brand, 3 to 255 characters
    #[serde(default)]
    pub brand: Option<String>,
    /// Listing category
    pub category: Category,
    /// Unit price, greater than zero
    pub price: f64,
    /// Units in stock, greater than zero
    pub quantity: i32,
    /// Item condition
    pub condition: Condition,
}

impl ProductDraft {
    /// Checks every field.
    pub fn validate(&self) -> Result<()> {
        validation::check_length("name", &self.name, 3, 255)?;
        validation::check_length("image", &self.image, 1, 1024)?;
        validation::check_length("description", &self.description, 3, 1000)?;
        if let Some(brand) = &self.brand {
            validation::check_length("brand", brand, 3, 255)?;
        }
        validation::check_positive("price", self.price)?;
        validation::check_positive("quantity", f64::from(self.quantity))
    }
}

/// Seller-side partial update. The derived rating fields are not patchable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    /// New title
    pub name: Option<String>,
    /// New image reference
    pub image: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New brand
    pub brand: Option<String>,
    /// New category
    pub category: Option<Category>,
    /// New price
    pub price: Option<f64>,
    /// New stock level
    pub quantity: Option<i32>,
    /// New condition
    pub condition: Option<Condition>,
}

impl ProductPatch {
    /// Validates whichever fields are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validation::check_length("name", name, 3, 255)?;
        }
        if let Some(image) = &self.image {
            validation::check_length("image", image, 1, 1024)?;
        }
        if let Some(description) = &self.description {
            validation::check_length("description", description, 3, 1000)?;
        }
        if let Some(brand) = &self.brand {
            validation::check_length("brand", brand, 3, 255)?;
        }
        if let Some(price) = self.price {
            validation::check_positive("price", price)?;
        }
        if let Some(quantity) = self.quantity {
            validation::check_positive("quantity", f64::from(quantity))?;
        }
        Ok(())
    }
}

/// Catalogue filters. All optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the brand
    pub brand: Option<String>,
    /// Exact category
    pub category: Option<Category>,
    /// Exact condition
    pub condition: Option<Condition>,
    /// Inclusive lower bound on the aggregate rating
    pub min_rating: Option<f64>,
}

/// One page of the catalogue.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Pagination metadata
    #[serde(flatten)]
    pub meta: PageMeta,
    /// Products on this page, newest first
    pub products: Vec<product::Model>,
}

/// Lists products matching `filter`, newest first.
///
/// The returned `total` counts the filtered set, not the whole catalogue.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
    page: PageRequest,
) -> Result<ProductPage> {
    let mut query = Product::find();
    if let Some(brand) = filter.brand.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(product::Column::Brand.like(validation::contains_literal(brand)));
    }
    if let Some(category) = filter.category {
        query = query.filter(product::Column::Category.eq(category));
    }
    if let Some(condition) = filter.condition {
        query = query.filter(product::Column::Condition.eq(condition));
    }
    if let Some(min_rating) = filter.min_rating {
        query = query.filter(product::Column::Rating.gte(min_rating));
    }

    let paginator = query
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let products = paginator.fetch_page(page.index()).await?;

    Ok(ProductPage {
        meta: page.meta(total),
        products,
    })
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns `Error::ProductNotFound` if no such product exists, or a database error.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Creates a new listing owned by `seller_id`, with no reviews and a zero rating.
///
/// # Errors
/// Returns an error if:
/// - Any field fails validation
/// - The database insert operation fails
#[instrument(skip(db, draft))]
pub async fn create_product(
    db: &DatabaseConnection,
    seller_id: i64,
    draft: &ProductDraft,
) -> Result<product::Model> {
    draft.validate()?;

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        seller_id: Set(seller_id),
        name: Set(draft.name.trim().to_string()),
        image: Set(draft.image.trim().to_string()),
        description: Set(draft.description.trim().to_string()),
        brand: Set(draft.brand.as_deref().map(|b| b.trim().to_string())),
        category: Set(draft.category),
        price: Set(draft.price),
        quantity: Set(draft.quantity),
        condition: Set(draft.condition),
        rating: Set(0.0),
        review_count: Set(0),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let product = product.insert(db).await?;

    info!(product_id = product.id, "Product created");
    Ok(product)
}

/// Loads a product and checks the actor may manage it.
async fn find_managed(db: &DatabaseConnection, product_id: i64, actor: &Actor) -> Result<product::Model> {
    let product = get_product(db, product_id).await?;
    if !actor.may_manage(product.seller_id) {
        warn!(
            actor_id = actor.id,
            product_id,
            seller_id = product.seller_id,
            "User tried to manage a listing they do not own"
        );
        return Err(Error::NotOwner {
            actor_id: actor.id,
            owner_id: product.seller_id,
        });
    }
    Ok(product)
}

/// Applies a partial update to a listing. Only the seller or a moderator may do so.
///
/// Only the columns present in the patch are written, so a concurrent review write
/// to the same product is never overwritten.
///
/// # Errors
/// Returns an error if:
/// - The patch fails validation
/// - The product does not exist
/// - The actor is neither the seller nor a moderator
/// - The database update operation fails
#[instrument(skip(db, actor, patch), fields(actor_id = actor.id))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    actor: &Actor,
    patch: &ProductPatch,
) -> Result<product::Model> {
    patch.validate()?;
    let mut product: product::ActiveModel = find_managed(db, product_id, actor).await?.into();

    if let Some(name) = &patch.name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(image) = &patch.image {
        product.image = Set(image.trim().to_string());
    }
    if let Some(description) = &patch.description {
        product.description = Set(description.trim().to_string());
    }
    if let Some(brand) = &patch.brand {
        product.brand = Set(Some(brand.trim().to_string()));
    }
    if let Some(category) = patch.category {
        product.category = Set(category);
    }
    if let Some(price) = patch.price {
        product.price = Set(price);
    }
    if let Some(quantity) = patch.quantity {
        product.quantity = Set(quantity);
    }
    if let Some(condition) = patch.condition {
        product.condition = Set(condition);
    }
    product.updated_at = Set(chrono::Utc::now());

    let product = product.update(db).await?;
    info!("Product updated");
    Ok(product)
}

/// Deletes a listing together with all of its reviews.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - The actor is neither the seller nor a moderator
/// - The database delete operations fail
#[instrument(skip(db, actor), fields(actor_id = actor.id))]
pub async fn delete_product(
    db: &DatabaseConnection,
    product_id: i64,
    actor: &Actor,
) -> Result<product::Model> {
    let product = find_managed(db, product_id, actor).await?;

    let txn = db.begin().await?;
    let removed = Review::delete_many()
        .filter(review::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    Product::delete_by_id(product_id).exec(&txn).await?;
    txn.commit().await?;

    info!(reviews_removed = removed.rows_affected, "Product deleted");
    Ok(product)
}
