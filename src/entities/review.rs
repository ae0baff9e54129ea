//! Review entity - A rating and comment left by a user on a product.
//!
//! Reviews have no lifecycle of their own; they are created, edited and removed
//! through their parent product and disappear with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Review database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Review)]
#[sea_orm(table_name = "reviews")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the review
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent product
    pub product_id: i64,
    /// Author's user ID, fixed at creation
    pub author_id: i64,
    /// Short headline
    pub title: String,
    /// Score between 0 and 5
    pub rating: f64,
    /// Review body
    pub comment: String,
    /// When the review was created
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
    /// When the review was last edited
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Review and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each review belongs to one product and is deleted with it
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
