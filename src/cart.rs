//! # Cart Module
//!
//! Ordered list of accepted matches. Every read and mutation goes through one
//! lock so concurrent batches see a consistent order. Carts are scoped per
//! session through [`CartRegistry`]; idle sessions expire and the registry
//! is bounded in size.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::CartConfig;
use crate::observability;

/// An accepted match placed in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog name as stored
    pub name: String,
    /// Quantity as parsed from the line, "1" by default
    pub quantity: String,
    /// Potency as parsed from the line
    pub potency: Option<String>,
}

impl CartItem {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, potency: Option<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            potency,
        }
    }
}

/// Mutex-serialized cart
#[derive(Debug, Default)]
pub struct CartStore {
    items: Mutex<Vec<CartItem>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item at the end; identical items are kept as separate entries
    pub fn append(&self, item: CartItem) {
        let mut items = self.items.lock();
        debug!(name = %item.name, quantity = %item.quantity, position = items.len(), "Appending cart item");
        items.push(item);
        observability::record_cart_metrics("append", items.len());
    }

    /// Append several items under a single lock, keeping their order
    pub fn extend<I>(&self, new_items: I)
    where
        I: IntoIterator<Item = CartItem>,
    {
        let mut items = self.items.lock();
        let before = items.len();
        items.extend(new_items);
        if items.len() > before {
            debug!(added = items.len() - before, "Appending cart items");
            observability::record_cart_metrics("append", items.len());
        }
    }

    /// Snapshot of the current contents in insertion order
    pub fn list(&self) -> Vec<CartItem> {
        self.items.lock().clone()
    }

    /// Remove the item at a zero-based index and return the contents afterwards.
    ///
    /// Negative or out-of-range indices leave the cart unchanged.
    pub fn remove_at(&self, index: i64) -> Vec<CartItem> {
        let mut items = self.items.lock();
        match usize::try_from(index) {
            Ok(i) if i < items.len() => {
                let removed = items.remove(i);
                debug!(index = i, name = %removed.name, "Removed cart item");
                observability::record_cart_metrics("remove", items.len());
            }
            _ => {
                debug!(index, len = items.len(), "Ignoring out-of-range cart removal");
            }
        }
        items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop every item
    pub fn clear(&self) {
        self.items.lock().clear();
        observability::record_cart_metrics("clear", 0);
    }
}

/// Cart shared between the resolver and its callers
pub type SharedCart = Arc<CartStore>;

/// Tracks when a session cart was last touched
#[derive(Debug, Clone)]
struct SessionEntry {
    cart: SharedCart,
    last_used: Instant,
}

/// Per-session carts with idle expiry and a size bound
#[derive(Debug)]
pub struct CartRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    /// Idle time after which a session cart is dropped
    ttl: Duration,
    /// Maximum number of live sessions
    max_sessions: usize,
}

impl CartRegistry {
    pub fn new(ttl_secs: u64, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
            max_sessions,
        }
    }

    /// Registry sized by the cart section of the application config
    pub fn from_config(config: &CartConfig) -> Self {
        Self::new(config.session_ttl_secs, config.max_sessions)
    }

    /// Cart for a session, created empty on first use
    pub fn cart_for(&self, session_id: &str) -> SharedCart {
        let mut sessions = self.sessions.lock();
        let now = Instant::now();

        // Drop idle sessions
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.ttl);
        if sessions.len() < before {
            debug!(expired = before - sessions.len(), "Expired idle cart sessions");
        }

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_used = now;
            return Arc::clone(&entry.cart);
        }

        if sessions.len() >= self.max_sessions {
            if let Some(oldest_key) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            {
                info!(session_id = %oldest_key, "Evicting least recently used cart session");
                sessions.remove(&oldest_key);
            }
        }

        let cart = SharedCart::default();
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                cart: Arc::clone(&cart),
                last_used: now,
            },
        );
        cart
    }

    /// Forget a session; returns whether it existed
    pub fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.lock().remove(session_id).is_some()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> CartRegistryStats {
        let sessions = self.sessions.lock();
        let now = Instant::now();

        let total_sessions = sessions.len();
        let expired_sessions = sessions
            .values()
            .filter(|entry| now.duration_since(entry.last_used) >= self.ttl)
            .count();
        let total_items = sessions.values().map(|entry| entry.cart.len()).sum();

        CartRegistryStats {
            total_sessions,
            active_sessions: total_sessions.saturating_sub(expired_sessions),
            expired_sessions,
            total_items,
            max_sessions: self.max_sessions,
            ttl: self.ttl,
        }
    }

    /// Drop every session
    pub fn clear(&self) {
        self.sessions.lock().clear();
    }
}

impl Default for CartRegistry {
    fn default() -> Self {
        Self::new(1800, 1000) // 30 minutes idle TTL, 1000 sessions
    }
}

/// Statistics about the cart registry
#[derive(Debug, Clone)]
pub struct CartRegistryStats {
    /// Sessions currently stored
    pub total_sessions: usize,
    /// Sessions used within the TTL
    pub active_sessions: usize,
    /// Sessions past the TTL (removed on next access)
    pub expired_sessions: usize,
    /// Items across all stored carts
    pub total_items: usize,
    pub max_sessions: usize,
    pub ttl: Duration,
}
