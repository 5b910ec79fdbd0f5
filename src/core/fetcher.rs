//! Transport abstraction

use crate::core::error::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GETs `url` and returns the decoded JSON body.
    async fn fetch(&self, url: &str) -> Result<Value>;
}
