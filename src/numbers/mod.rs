//! Client for the numbers trivia endpoint.
//!
//! `GET {base_url}/{number}` returns a plain-text fact. The body is treated
//! as an opaque display string; status codes get no special handling.

mod client;
mod error;

pub use client::NumbersClient;
pub use error::NumbersError;
