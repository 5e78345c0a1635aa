//! In-memory sales store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use buffet_pos_core::{
    DateRange, NewSale, Result, Sale, SaleId, SalePatch, SalesStore, StoreError,
};

/// Sales kept in a `BTreeMap` keyed by id, so listings come out in id order.
///
/// Ids are assigned sequentially starting at 1 and never reused.
pub struct InMemorySalesStore {
    inner: RwLock<Inner>,
}

struct Inner {
    sales: BTreeMap<SaleId, Sale>,
    next_id: SaleId,
}

impl InMemorySalesStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                sales: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Pre-populate with existing records (ids are kept)
    pub fn with_sales(sales: impl IntoIterator<Item = Sale>) -> Self {
        let sales: BTreeMap<SaleId, Sale> = sales.into_iter().map(|s| (s.id, s)).collect();
        let next_id = sales.keys().next_back().map_or(1, |id| id + 1);
        Self {
            inner: RwLock::new(Inner { sales, next_id }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySalesStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(sale: &NewSale) -> Result<()> {
    let problem = if sale.date.trim().is_empty() {
        Some("date is required")
    } else if sale.table_number == 0 {
        Some("tableNumber must be positive")
    } else if sale.customer_count == 0 {
        Some("customerCount must be positive")
    } else if sale.buffet_type.trim().is_empty() {
        Some("buffetType is required")
    } else if sale.price_per_person == 0 {
        Some("pricePerPerson must be positive")
    } else if sale.payment_method.trim().is_empty() {
        Some("paymentMethod is required")
    } else {
        None
    };
    match problem {
        Some(msg) => Err(StoreError::InvalidData(msg.to_string())),
        None => Ok(()),
    }
}

#[async_trait]
impl SalesStore for InMemorySalesStore {
    async fn list(&self, filter: Option<DateRange>) -> Result<Vec<Sale>> {
        let inner = self.inner.read();
        let sales = inner
            .sales
            .values()
            .filter(|sale| match filter {
                // Dates that do not parse never match a range
                Some(range) => sale.parsed_date().is_some_and(|d| range.contains(d)),
                None => true,
            })
            .cloned()
            .collect();
        Ok(sales)
    }

    async fn create(&self, sale: NewSale) -> Result<Sale> {
        validate(&sale)?;
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        let record = Sale::from_new(id, sale);
        inner.sales.insert(id, record.clone());
        tracing::debug!(sale_id = id, total_amount = record.total_amount, "Sale created");
        Ok(record)
    }

    async fn update(&self, id: SaleId, patch: SalePatch) -> Result<()> {
        let mut inner = self.inner.write();
        let sale = inner.sales.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        sale.apply(&patch);
        tracing::debug!(sale_id = id, "Sale updated");
        Ok(())
    }

    async fn delete(&self, id: SaleId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.sales.remove(&id).ok_or(StoreError::NotFound(id))?;
        tracing::debug!(sale_id = id, "Sale deleted");
        Ok(())
    }

    async fn get(&self, id: SaleId) -> Result<Option<Sale>> {
        Ok(self.inner.read().sales.get(&id).cloned())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_sale(date: &str, customers: u32, price: u32) -> NewSale {
        NewSale {
            date: date.to_string(),
            table_number: 3,
            customer_count: customers,
            buffet_type: "standard".to_string(),
            price_per_person: price,
            payment_method: "cash".to_string(),
            total_amount: u64::from(customers) * u64::from(price),
        }
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let store = InMemorySalesStore::new();
        let a = store.create(new_sale("2025-01-01", 2, 299)).await.unwrap();
        let b = store.create(new_sale("2025-01-02", 2, 299)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete(b.id).await.unwrap();
        let c = store.create(new_sale("2025-01-03", 2, 299)).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn test_range_filter_inclusive() {
        let store = InMemorySalesStore::new();
        store.create(new_sale("2024-12-31", 1, 299)).await.unwrap();
        store.create(new_sale("2025-01-01", 2, 299)).await.unwrap();
        store.create(new_sale("2025-01-31", 3, 399)).await.unwrap();
        store.create(new_sale("2025-02-01", 4, 599)).await.unwrap();
        store.create(new_sale("15", 5, 599)).await.unwrap();

        let range = DateRange::parse("2025-01-01", "2025-01-31").unwrap();
        let january = store.list(Some(range)).await.unwrap();
        assert_eq!(january.len(), 2);
        assert!(january.iter().all(|s| s.date.starts_with("2025-01")));

        assert_eq!(store.list(None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_update_and_not_found() {
        let store = InMemorySalesStore::new();
        let sale = store.create(new_sale("2025-01-01", 2, 299)).await.unwrap();

        store
            .update(
                sale.id,
                SalePatch {
                    customer_count: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let updated = store.get(sale.id).await.unwrap().unwrap();
        assert_eq!(updated.customer_count, 5);
        assert_eq!(updated.total_amount, 5 * 299);

        assert_eq!(
            store.update(99, SalePatch::default()).await,
            Err(StoreError::NotFound(99))
        );
        assert_eq!(store.delete(99).await, Err(StoreError::NotFound(99)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_sale() {
        let store = InMemorySalesStore::new();
        let mut sale = new_sale("2025-01-01", 2, 299);
        sale.payment_method = " ".to_string();
        assert!(matches!(store.create(sale).await, Err(StoreError::InvalidData(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_with_sales_continues_ids() {
        let seeded = Sale::from_new(41, new_sale("2025-01-01", 1, 299));
        let store = InMemorySalesStore::with_sales(vec![seeded]);
        let next = store.create(new_sale("2025-01-02", 1, 299)).await.unwrap();
        assert_eq!(next.id, 42);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(InMemorySalesStore::new());
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_sale("2025-01-01", 1, 299)).await })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }
}
