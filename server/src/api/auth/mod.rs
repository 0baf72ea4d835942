//! API key authentication
//!
//! Keys are hashed before lookup. Hashes confirmed valid are cached in
//! process; the middleware attaches an [`AuthenticatedKey`] to each accepted
//! request.

mod authenticator;
mod cache;
pub mod middleware;

pub use authenticator::{ApiKeyAuthError, ApiKeyAuthenticator, AuthenticatedKey, extract_api_key};
pub use cache::ApiKeyCache;
pub use middleware::require_api_key;
