//! Normalization of list responses into one canonical page shape.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Page size assumed when the server reports a count but no page count.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Always at least 1.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// A single page holding `items`.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            total_pages: 1,
        }
    }
}

/// Accept either a paged envelope (`results`, `count`, optional
/// `total_pages`) or a bare array.
///
/// `total_pages` is taken from the envelope when present, otherwise derived
/// as `ceil(count / page_size)`, otherwise 1.
pub fn normalize<T: DeserializeOwned>(value: Value, page_size: u32) -> Result<Page<T>, serde_json::Error> {
    match value {
        Value::Object(mut envelope) => {
            let items = match envelope.remove("results") {
                Some(results) => serde_json::from_value(results)?,
                None => Vec::new(),
            };

            let page_size = u64::from(page_size.max(1));
            let total_pages = envelope
                .get("total_pages")
                .and_then(Value::as_u64)
                .filter(|pages| *pages > 0)
                .or_else(|| {
                    envelope
                        .get("count")
                        .and_then(Value::as_u64)
                        .map(|count| count.div_ceil(page_size))
                })
                .unwrap_or(1)
                .max(1);

            Ok(Page {
                items,
                total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            })
        }
        Value::Null => Ok(Page::single(Vec::new())),
        other => Ok(Page::single(serde_json::from_value(other)?)),
    }
}
