//! Keyed single-flight joiner: concurrent requests for the same key share
//! one computation instead of racing. A lost lock degrades to running the
//! work directly rather than failing the request.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

pub struct Inflight<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for Inflight<K, V> {
    fn default() -> Self {
        Inflight {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Inflight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make` for this key, or await a computation already in flight
    /// for it. The slot is cleared once the result is delivered so later
    /// requests compute fresh.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = match self.slots.lock() {
            Ok(mut slots) => slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone(),
            Err(_) => return make().await,
        };

        let value = cell.get_or_init(make).await.clone();

        if let Ok(mut slots) = self.slots.lock() {
            if let Some(current) = slots.get(&key) {
                if Arc::ptr_eq(current, &cell) {
                    slots.remove(&key);
                }
            }
        }
        value
    }
}
