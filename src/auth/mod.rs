pub mod claims;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::Identity;
pub use jwks::{JwksCache, JwksError, KeyResolver, StaticKeys};
pub use middleware::{AuthMiddleware, AuthenticatedAdmin, AuthenticatedIdentity};
pub use verifier::TokenVerifier;
