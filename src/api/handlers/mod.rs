/// Login, token refresh and logout
pub mod auth;

/// Product catalogue and seller management
pub mod products;

/// Product reviews
pub mod reviews;

/// Registration, profiles and user administration
pub mod users;
