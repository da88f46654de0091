//! Bearer-token sessions for the HTTP API.

pub mod extractor;
pub mod handlers;
