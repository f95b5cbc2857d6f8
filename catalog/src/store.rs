//! The entity-store seam.
//!
//! The batch executor talks to the managed backend exclusively through this
//! trait, so its sequencing and failure handling compile with zero vendor
//! coupling and tests substitute fakes that fail on demand.

use crate::errors::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Remote entity store. Each call may fail independently; there is no
/// transactional guarantee across calls.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    async fn filter(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Applies a partial update to one entity.
    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
