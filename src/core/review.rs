//! Review business logic - the product aggregate and every review operation on it.
//!
//! A product and its reviews form one consistency boundary. Every mutating operation
//! loads the whole aggregate inside a database transaction, applies exactly one review
//! change in memory, recomputes `rating`/`review_count` with [`rating::aggregate`], and
//! writes everything back in the same transaction. The product's `version` column is
//! checked on write; if another request got there first the whole read-modify-write is
//! retried, up to [`MAX_WRITE_ATTEMPTS`] times, before giving up with
//! [`Error::WriteConflict`].
//!
//! Listing is read-only and never takes part in that protocol, so it may observe an
//! aggregate that is about to change.

use crate::{
    core::{
        access::{self, Actor},
        pagination::{PageMeta, PageRequest},
        rating::{self, RatingSummary},
        validation,
    },
    entities::{Product, Review, User, product, review, user},
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tracing::{debug, info, instrument, warn};

/// How many times a review write is attempted before a version conflict is surfaced.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Fields of a new review, as submitted by its author.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewDraft {
    /// Short headline, 3 to 50 characters
    pub title: String,
    /// Score between 0 and 5
    pub rating: f64,
    /// Review body, 5 to 255 characters
    pub comment: String,
}

impl ReviewDraft {
    /// Checks field lengths and the rating range.
    pub fn validate(&self) -> Result<()> {
        validation::check_length("title", &self.title, 3, 50)?;
        validation::check_range("rating", self.rating, 0.0, 5.0)?;
        validation::check_length("comment", &self.comment, 5, 255)
    }
}

/// Partial update of a review. Only these three fields can ever change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewPatch {
    /// New headline
    pub title: Option<String>,
    /// New score
    pub rating: Option<f64>,
    /// New body
    pub comment: Option<String>,
}

impl ReviewPatch {
    /// Validates whichever fields are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validation::check_length("title", title, 3, 50)?;
        }
        if let Some(rating) = self.rating {
            validation::check_range("rating", rating, 0.0, 5.0)?;
        }
        if let Some(comment) = &self.comment {
            validation::check_length("comment", comment, 5, 255)?;
        }
        Ok(())
    }
}

/// Predicates applied when listing a product's reviews. All are optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    /// Case-insensitive substring of the author's name
    pub author: Option<String>,
    /// Inclusive lower bound on the rating
    pub min_rating: Option<f64>,
    /// Inclusive upper bound on the rating
    pub max_rating: Option<f64>,
    /// Only reviews created at or after this instant
    pub created_from: Option<DateTimeUtc>,
    /// Only reviews created at or before this instant
    pub created_to: Option<DateTimeUtc>,
}

/// One page of reviews plus the product's current aggregate rating.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    /// Pagination metadata
    #[serde(flatten)]
    pub meta: PageMeta,
    /// Product's stored aggregate rating
    pub rating: f64,
    /// Reviews on this page, newest first
    pub reviews: Vec<review::Model>,
}

/// The single review change a write applies to an aggregate.
#[derive(Debug, Clone)]
pub enum ReviewChange {
    /// A new review waiting for its server-assigned ID
    Added {
        /// Author of the new review
        author_id: i64,
        /// Submitted fields
        draft: ReviewDraft,
        /// Creation timestamp
        at: DateTimeUtc,
    },
    /// An existing review after its fields were patched
    Edited(review::Model),
    /// A review taken out of the collection
    Removed(review::Model),
}

/// A product together with all of its reviews, loaded as one unit.
#[derive(Debug, Clone)]
pub struct ProductAggregate {
    product: product::Model,
    reviews: Vec<review::Model>,
}

impl ProductAggregate {
    /// Loads a product and its reviews (oldest first).
    ///
    /// # Errors
    /// Returns `Error::ProductNotFound` if no such product exists.
    pub async fn load<C>(conn: &C, product_id: i64) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let product = Product::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;

        let reviews = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_asc(review::Column::Id)
            .all(conn)
            .await?;

        Ok(Self { product, reviews })
    }

    /// The product row as loaded.
    #[must_use]
    pub const fn product(&self) -> &product::Model {
        &self.product
    }

    /// The reviews currently held by the aggregate.
    #[must_use]
    pub fn reviews(&self) -> &[review::Model] {
        &self.reviews
    }

    /// Recomputes the aggregate rating over the held reviews plus a pending addition.
    #[must_use]
    pub fn summary(&self, change: Option<&ReviewChange>) -> RatingSummary {
        let pending = match change {
            Some(ReviewChange::Added { draft, .. }) => Some(draft.rating),
            _ => None,
        };
        rating::aggregate(self.reviews.iter().map(|r| r.rating).chain(pending))
    }

    fn position(&self, review_id: i64) -> Result<usize> {
        self.reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or(Error::ReviewNotFound { id: review_id })
    }

    /// Stages a new review, rejecting a second review by the same author.
    ///
    /// Reviews per product are few, so the duplicate check is a linear scan; the unique
    /// `(product_id, author_id)` index backs it up in storage.
    pub fn add_review(
        &self,
        author_id: i64,
        draft: &ReviewDraft,
        at: DateTimeUtc,
    ) -> Result<ReviewChange> {
        if self.reviews.iter().any(|r| r.author_id == author_id) {
            return Err(Error::DuplicateReview {
                product_id: self.product.id,
                author_id,
            });
        }

        Ok(ReviewChange::Added {
            author_id,
            draft: draft.clone(),
            at,
        })
    }

    /// Applies a patch to one review, allowed only for its author.
    pub fn edit_review(
        &mut self,
        review_id: i64,
        actor_id: i64,
        patch: &ReviewPatch,
        at: DateTimeUtc,
    ) -> Result<ReviewChange> {
        let index = self.position(review_id)?;
        let review = &mut self.reviews[index];

        if !access::can_modify(actor_id, review.author_id) {
            warn!(
                actor_id,
                review_id,
                author_id = review.author_id,
                "User tried to edit a review they did not write"
            );
            return Err(Error::NotOwner {
                actor_id,
                owner_id: review.author_id,
            });
        }

        if let Some(title) = &patch.title {
            review.title = title.trim().to_string();
        }
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(comment) = &patch.comment {
            review.comment = comment.trim().to_string();
        }
        review.updated_at = at;

        Ok(ReviewChange::Edited(review.clone()))
    }

    /// Takes one review out of the collection; its author or a moderator may do so.
    pub fn remove_review(&mut self, review_id: i64, actor: &Actor) -> Result<ReviewChange> {
        let index = self.position(review_id)?;
        let author_id = self.reviews[index].author_id;

        if !actor.may_manage(author_id) {
            warn!(
                actor_id = actor.id,
                review_id, author_id, "User tried to delete a review they did not write"
            );
            return Err(Error::NotOwner {
                actor_id: actor.id,
                owner_id: author_id,
            });
        }

        Ok(ReviewChange::Removed(self.reviews.remove(index)))
    }

    /// Writes the change and the recomputed aggregate fields.
    ///
    /// The product row is written first and only if its version is still the one that
    /// was loaded; otherwise nothing is written and `Error::WriteConflict` is returned.
    async fn save(self, txn: &DatabaseTransaction, change: ReviewChange) -> Result<review::Model> {
        let summary = self.summary(Some(&change));
        let review_count = i32::try_from(summary.count)?;

        let written = Product::update_many()
            .col_expr(product::Column::Rating, Expr::value(summary.average))
            .col_expr(product::Column::ReviewCount, Expr::value(review_count))
            .col_expr(
                product::Column::Version,
                Expr::col(product::Column::Version).add(1),
            )
            .filter(product::Column::Id.eq(self.product.id))
            .filter(product::Column::Version.eq(self.product.version))
            .exec(txn)
            .await?;

        if written.rows_affected == 0 {
            return Err(Error::WriteConflict {
                product_id: self.product.id,
            });
        }

        debug!(
            product_id = self.product.id,
            rating = summary.average,
            review_count,
            "Aggregate rating recomputed"
        );

        match change {
            ReviewChange::Added {
                author_id,
                draft,
                at,
            } => {
                let review = review::ActiveModel {
                    product_id: Set(self.product.id),
                    author_id: Set(author_id),
                    title: Set(draft.title.trim().to_string()),
                    rating: Set(draft.rating),
                    comment: Set(draft.comment.trim().to_string()),
                    created_at: Set(at),
                    updated_at: Set(at),
                    ..Default::default()
                };
                review.insert(txn).await.map_err(|e| match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateReview {
                        product_id: self.product.id,
                        author_id,
                    },
                    _ => e.into(),
                })
            }
            ReviewChange::Edited(edited) => {
                let mut review: review::ActiveModel = edited.clone().into();
                review.title = Set(edited.title);
                review.rating = Set(edited.rating);
                review.comment = Set(edited.comment);
                review.updated_at = Set(edited.updated_at);
                review.update(txn).await.map_err(Into::into)
            }
            ReviewChange::Removed(removed) => {
                Review::delete_by_id(removed.id).exec(txn).await?;
                Ok(removed)
            }
        }
    }
}

/// Runs one read-modify-write cycle against a product, retrying on version conflicts.
///
/// `apply` is called once per attempt on a freshly loaded aggregate, so it must not
/// depend on state from a previous attempt. Errors returned by `apply` abort at once.
async fn write_reviews<F>(
    db: &DatabaseConnection,
    product_id: i64,
    mut apply: F,
) -> Result<review::Model>
where
    F: FnMut(&mut ProductAggregate) -> Result<ReviewChange>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let txn = db.begin().await?;
        let mut aggregate = ProductAggregate::load(&txn, product_id).await?;
        let change = apply(&mut aggregate)?;

        match aggregate.save(&txn, change).await {
            Ok(review) => {
                txn.commit().await?;
                return Ok(review);
            }
            Err(Error::WriteConflict { .. }) => {
                txn.rollback().await?;
                warn!(product_id, attempt, "Concurrent review write detected, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::WriteConflict { product_id })
}

/// Adds the author's review to a product and updates its rating.
///
/// # Errors
/// Returns an error if:
/// - The draft fails validation
/// - The product does not exist
/// - The author already reviewed this product
/// - The write keeps conflicting with concurrent writers
#[instrument(skip(db, draft))]
pub async fn add_review(
    db: &DatabaseConnection,
    product_id: i64,
    author_id: i64,
    draft: &ReviewDraft,
) -> Result<review::Model> {
    draft.validate()?;

    let review = write_reviews(db, product_id, |aggregate| {
        aggregate.add_review(author_id, draft, chrono::Utc::now())
    })
    .await?;

    info!(review_id = review.id, "Review created");
    Ok(review)
}

/// Applies a partial update to a review and updates the product's rating.
///
/// # Errors
/// Returns an error if the patch is invalid, the product or review does not exist,
/// the actor is not the author, or the write keeps conflicting.
#[instrument(skip(db, patch))]
pub async fn update_review(
    db: &DatabaseConnection,
    product_id: i64,
    review_id: i64,
    actor_id: i64,
    patch: &ReviewPatch,
) -> Result<review::Model> {
    patch.validate()?;

    let review = write_reviews(db, product_id, |aggregate| {
        aggregate.edit_review(review_id, actor_id, patch, chrono::Utc::now())
    })
    .await?;

    info!("Review updated");
    Ok(review)
}

/// Removes a review and updates the product's rating (back to 0 when none remain).
///
/// # Errors
/// Returns an error if the product or review does not exist, the actor is neither the
/// author nor a moderator, or the write keeps conflicting.
#[instrument(skip(db, actor), fields(actor_id = actor.id))]
pub async fn remove_review(
    db: &DatabaseConnection,
    product_id: i64,
    review_id: i64,
    actor: &Actor,
) -> Result<review::Model> {
    let removed = write_reviews(db, product_id, |aggregate| {
        aggregate.remove_review(review_id, actor)
    })
    .await?;

    info!("Review deleted");
    Ok(removed)
}

/// Fetches a single review of a product.
///
/// # Errors
/// Returns `Error::ProductNotFound` or `Error::ReviewNotFound` when either is missing.
pub async fn get_review(
    db: &DatabaseConnection,
    product_id: i64,
    review_id: i64,
) -> Result<review::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    Review::find_by_id(review_id)
        .filter(review::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or(Error::ReviewNotFound { id: review_id })
}

/// Lists a page of a product's reviews, newest first, with the product's stored rating.
///
/// # Errors
/// Returns `Error::ProductNotFound` if the product does not exist, or a database error.
#[instrument(skip(db))]
pub async fn list_reviews(
    db: &DatabaseConnection,
    product_id: i64,
    filter: &ReviewFilter,
    page: PageRequest,
) -> Result<ReviewPage> {
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let mut query = Review::find().filter(review::Column::ProductId.eq(product_id));

    if let Some(author) = filter
        .author
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        let author_ids: Vec<i64> = User::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Name.like(validation::contains_literal(author)))
            .into_tuple()
            .all(db)
            .await?;
        query = query.filter(review::Column::AuthorId.is_in(author_ids));
    }
    if let Some(min_rating) = filter.min_rating {
        query = query.filter(review::Column::Rating.gte(min_rating));
    }
    if let Some(max_rating) = filter.max_rating {
        query = query.filter(review::Column::Rating.lte(max_rating));
    }
    if let Some(from) = filter.created_from {
        query = query.filter(review::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.created_to {
        query = query.filter(review::Column::CreatedAt.lte(to));
    }

    let paginator = query
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let reviews = paginator.fetch_page(page.index()).await?;

    debug!(total, returned = reviews.len(), "Listed reviews");
    Ok(ReviewPage {
        meta: page.meta(total),
        rating: product.rating,
        reviews,
    })
}
