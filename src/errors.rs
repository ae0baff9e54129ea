use thiserror::Error;

/// Every failure the marketplace can report, from request validation up to storage.
///
/// The HTTP status each variant maps to lives in `api::error`; core code only
/// decides *which* failure happened.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input
    #[error("{message}")]
    Validation {
        /// Human readable reason, safe to show to clients
        message: String,
    },

    /// Product lookup failed
    #[error("Product not found")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// Review lookup failed within a product
    #[error("Review not found")]
    ReviewNotFound {
        /// Requested review id
        id: i64,
    },

    /// User lookup failed
    #[error("User not found")]
    UserNotFound {
        /// Requested user id
        id: i64,
    },

    /// The author already has a review on this product
    #[error("You have already submitted a review for this product")]
    DuplicateReview {
        /// Product the duplicate was aimed at
        product_id: i64,
        /// Author of the existing review
        author_id: i64,
    },

    /// Actor is not the owner of the resource it tried to change
    #[error("Operation denied")]
    NotOwner {
        /// Acting user
        actor_id: i64,
        /// Owner of the resource
        owner_id: i64,
    },

    /// Actor's role is below the required one
    #[error("{required} privileges required")]
    InsufficientRole {
        /// Human readable name of the minimum role
        required: String,
    },

    /// No credentials were presented
    #[error("Access denied. No token provided")]
    Unauthenticated,

    /// Credentials were presented but could not be verified
    #[error("Invalid or expired access token")]
    InvalidToken,

    /// Login with an unknown email or a wrong password
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// Account exists but is not active
    #[error("Account is {status}")]
    AccountInactive {
        /// Current account status
        status: String,
    },

    /// Another writer changed the product between read and write, retries exhausted
    #[error("Product {product_id} was modified concurrently, please retry")]
    WriteConflict {
        /// Contended product
        product_id: i64,
    },

    /// Startup or environment misconfiguration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Token signing or decoding failure outside of normal rejection
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failure
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying error text
        message: String,
    },

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Integer did not fit the storage type
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
