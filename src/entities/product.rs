//! Product entity - Represents trading-card listings.
//!
//! A product is the aggregate root for its reviews: `rating` and `review_count` are
//! derived from the review rows and are only ever written together with them.
//! `version` is the optimistic-concurrency token guarding that write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Listing category. The marketplace only sells trading cards for now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Single cards, boosters and sealed product
    #[sea_orm(string_value = "trading-card")]
    TradingCard,
}

/// Physical condition of the listed item
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Factory sealed / unplayed
    #[sea_orm(string_value = "new")]
    New,
    /// Previously owned
    #[sea_orm(string_value = "used")]
    Used,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Product)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the selling user
    pub seller_id: i64,
    /// Listing title (e.g., "Charizard Base Set Holo")
    pub name: String,
    /// Reference to the listing image (path or URL)
    pub image: String,
    /// Free-form description
    pub description: String,
    /// Optional publisher or brand
    pub brand: Option<String>,
    /// Listing category
    pub category: Category,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub quantity: i32,
    /// Item condition
    pub condition: Condition,
    /// Mean review rating, one decimal, 0 when unreviewed
    pub rating: f64,
    /// Number of reviews
    pub review_count: i32,
    /// Incremented on every review write
    #[serde(skip)]
    pub version: i64,
    /// When the product was created
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product owns many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
