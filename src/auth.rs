//! OAuth 凭证与令牌缓存。
//!
//! Client credentials and the bearer token cache.

pub mod credentials;
pub mod token;

pub use credentials::ClientCredentials;
pub use token::{Credential, TokenManager};
