//! Sales store trait
//!
//! Data-access interface shared by the command dispatcher and the REST
//! handlers. Implementations must be safe to call concurrently.

use async_trait::async_trait;

use crate::error::Result;
use crate::sale::{DateRange, NewSale, Sale, SaleId, SalePatch};

#[async_trait]
pub trait SalesStore: Send + Sync {
    /// List sales, optionally restricted to an inclusive date range
    async fn list(&self, filter: Option<DateRange>) -> Result<Vec<Sale>>;

    /// Persist a new sale and return it with its assigned id
    async fn create(&self, sale: NewSale) -> Result<Sale>;

    /// Apply a patch; `StoreError::NotFound` if the id does not exist
    async fn update(&self, id: SaleId, patch: SalePatch) -> Result<()>;

    /// Delete a sale; `StoreError::NotFound` if the id does not exist
    async fn delete(&self, id: SaleId) -> Result<()>;

    /// Fetch one sale
    async fn get(&self, id: SaleId) -> Result<Option<Sale>> {
        Ok(self.list(None).await?.into_iter().find(|s| s.id == id))
    }

    /// Store name for logging
    fn name(&self) -> &str {
        "sales-store"
    }
}
