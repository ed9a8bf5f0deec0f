//! HTTP transport shared by the token manager and the recognition client.

pub mod http;

pub use http::{HttpResponse, HttpTransport, TransportError};
