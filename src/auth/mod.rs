//! Identity provider integration
//!
//! Token verification and request extractors. Account storage lives with
//! the provider; this module only validates what it issued.

pub mod middleware;
pub mod token;

pub use middleware::{CurrentUser, MaybeUser};
pub use token::{Identity, create_token, verify_token};
