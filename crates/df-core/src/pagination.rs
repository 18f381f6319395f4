//! # Pagination
//!
//! Shared offset/limit arithmetic for every list operation.
//! A separate count is taken alongside each page, so `is_next` is
//! `total > skip + returned` and `limit` is exactly the page size.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Offset window handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

/// Computes the store window for a 1-based page.
pub fn paginate(page: u32, page_size: u32) -> Result<Window> {
    if page == 0 {
        return Err(AppError::Validation("page must be at least 1".into()));
    }
    if page_size == 0 {
        return Err(AppError::Validation("page size must be greater than 0".into()));
    }
    Ok(Window {
        skip: u64::from(page - 1) * u64::from(page_size),
        limit: u64::from(page_size),
    })
}

pub fn has_next(total: u64, skip: u64, returned: usize) -> bool {
    total > skip + returned as u64
}

/// Page coordinates as they arrive from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn window(&self) -> Result<Window> {
        paginate(self.page, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub is_next: bool,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, window: Window) -> Self {
        let is_next = has_next(total, window.skip, items.len());
        Self { items, is_next, total }
    }

    pub fn empty() -> Self {
        Self { items: Vec::new(), is_next: false, total: 0 }
    }
}
