//! Notecard REST and streaming API.
//!
//! [`ApiClient`] owns transport concerns (bearer tokens, refresh on 401, SSE
//! framing). Endpoint wrappers live in the submodules as inherent methods.

mod client;
mod flashcards;
mod notes;
mod session;
pub mod sse;
mod stream;
mod users;

use serde::Serialize;
use serde_json::Value;

pub use client::ApiClient;
pub use notes::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_THRESHOLD};
pub use stream::StreamHandle;

use crate::error::{ApiError, ApiResult};

/// Page size used by listings when the caller does not pick one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

fn to_body<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|error| ApiError::Decode(error.to_string()))
}
