use std::sync::Arc;

use dashmap::DashMap;

use crate::models::{Order, OrderStatus};

/// In-process store of known orders keyed by order identifier.
///
/// Entries are created at checkout submission time and mutated by the IPN
/// listener and the status poller; DashMap's shard locks serialize writers
/// racing on the same key. Entries are never evicted, so the map grows
/// without bound over the process lifetime.
#[derive(Clone)]
pub struct TransactionRegistry {
    orders: Arc<DashMap<String, Order>>,
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
        }
    }
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new order. The caller is expected to insert before the
    /// gateway is contacted so a crash mid-flow still leaves a traceable
    /// record.
    pub fn insert(&self, order: Order) {
        self.orders.insert(order.order_id.clone(), order);
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.get(order_id).map(|entry| entry.clone())
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Overwrites the status of a known order, returning the updated record.
    /// Returns `None` when the identifier is unknown.
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> Option<Order> {
        self.orders.get_mut(order_id).map(|mut entry| {
            entry.status = status;
            entry.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingContact;

    fn sample_order() -> Order {
        Order::new(250, "Test order".into(), "RWF".into(), BillingContact::default())
    }

    #[test]
    fn insert_and_get_round_trip() {
        let registry = TransactionRegistry::new();
        let order = sample_order();
        let id = order.order_id.clone();
        registry.insert(order);

        let fetched = registry.get(&id).expect("order should be present");
        assert_eq!(fetched.order_id, id);
        assert_eq!(fetched.status, OrderStatus::Pending);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn update_status_overwrites_known_orders_only() {
        let registry = TransactionRegistry::new();
        let order = sample_order();
        let id = order.order_id.clone();
        registry.insert(order);

        let updated = registry.update_status(&id, OrderStatus::Completed);
        assert_eq!(updated.unwrap().status, OrderStatus::Completed);
        assert_eq!(registry.get(&id).unwrap().status, OrderStatus::Completed);

        assert!(registry.update_status("ORDER-ffffffffff", OrderStatus::Failed).is_none());
    }

    #[test]
    fn concurrent_writers_to_same_key_do_not_lose_the_entry() {
        let registry = TransactionRegistry::new();
        let order = sample_order();
        let id = order.order_id.clone();
        registry.insert(order);

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            let id = id.clone();
            handles.push(std::thread::spawn(move || {
                let status = if i % 2 == 0 {
                    OrderStatus::Completed
                } else {
                    OrderStatus::Failed
                };
                registry.update_status(&id, status);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Last-writer wins; either way the entry survives with one of the
        // written statuses.
        let status = registry.get(&id).unwrap().status;
        assert!(matches!(status, OrderStatus::Completed | OrderStatus::Failed));
    }
}
