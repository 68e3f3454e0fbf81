//! Item provisioning and lookup.
//!
//! Thin operator-facing wrapper around the store. No concurrency risk of its
//! own: stock mutation stays with the ledger.

use std::sync::Arc;

use curio_catalog::Item;
use curio_core::{DomainError, ItemId, Money};

use crate::error::EngineError;
use crate::store::Store;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_item(
        &self,
        name: impl Into<String>,
        stock: i64,
        price: Money,
    ) -> Result<Item, EngineError> {
        let item = Item::new(ItemId::new(), name, stock, price)?;
        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.insert_item(&item).await {
            let _ = tx.rollback().await;
            return Err(err.into());
        }
        tx.commit().await?;
        Ok(item)
    }

    pub async fn fetch_item(&self, item_id: ItemId) -> Result<Item, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = tx.fetch_item(item_id).await;
        match result {
            Ok(Some(item)) => {
                tx.commit().await?;
                Ok(item)
            }
            Ok(None) => {
                let _ = tx.rollback().await;
                Err(DomainError::NotFound.into())
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.into())
            }
        }
    }
}
