//! HTTP request pipeline and the marketplace REST surface.

mod client;
mod endpoints;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ApiResult};
