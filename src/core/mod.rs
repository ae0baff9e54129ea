/// Authorization predicates (ownership and role ordering)
pub mod access;

/// Page/limit clamping and page metadata
pub mod pagination;

/// Product listing, lookup and seller-side management
pub mod product;

/// Aggregate rating computation
pub mod rating;

/// Reviews and the product aggregate they live in
pub mod review;

/// Password hashing, tokens and request authentication
pub mod session;

/// Account registration, profiles and administration
pub mod user;

/// Shared input checks
pub mod validation;
