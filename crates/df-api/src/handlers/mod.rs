//! # df-api Handlers
//!
//! Thin adapters: decode the request, resolve the caller, call one forum
//! operation, encode the result as JSON.

pub mod answers;
pub mod questions;
pub mod search;
pub mod tags;
pub mod users;
pub mod webhooks;

use df_core::pagination::{PageRequest, DEFAULT_PAGE_SIZE};

/// Missing coordinates fall back to the first page of the default size.
pub(crate) fn page_request(page: Option<u32>, page_size: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
}
