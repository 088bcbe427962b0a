//! Per-user session scratch data: the active dialogue and the shopping cart.
//!
//! Sessions live in memory only and are lost on restart; the cart in particular is not
//! persisted. Each user's session sits behind its own async mutex so events from one
//! user are processed strictly in order while other users proceed in parallel.

use crate::core::{UserId, catalog::CatalogItem};
use dashmap::DashMap;
use std::{
    collections::{BTreeMap, btree_map::Entry},
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// The dialogue a user is currently in
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Conversation {
    /// No dialogue; free text is not interpreted
    #[default]
    Idle,
    /// Purchase entered, waiting for the digits-only fulfillment identifier
    AwaitingFulfillmentId {
        /// Catalog id of the product being bought
        product_id: String,
    },
    /// Deposit entered, waiting for the transferred amount
    AwaitingAmount {
        /// Payment method tag recorded on the journal entry
        method: String,
    },
    /// Amount accepted, waiting for the external transaction reference
    AwaitingTransactionRef {
        /// Payment method tag recorded on the journal entry
        method: String,
        /// Claimed amount
        amount: f64,
    },
    /// Administrator started a broadcast, waiting for the message body
    AwaitingBroadcast,
}

impl Conversation {
    /// Whether a dialogue is in progress
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// A product remembered in the cart
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    /// Product display name
    pub name: String,
    /// Catalog id
    pub product_id: String,
    /// Price when added; purchases always charge the current catalog price
    pub price: f64,
    /// Category path for display
    pub breadcrumb: String,
}

/// Products keyed by display name; adding the same name again replaces the entry.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: BTreeMap<String, CartEntry>,
}

impl Cart {
    /// Adds or replaces a product.
    pub fn add(&mut self, product: &CatalogItem) -> &CartEntry {
        let entry = CartEntry {
            name: product.name.clone(),
            product_id: product.id.clone(),
            price: product.price.unwrap_or_default(),
            breadcrumb: product.breadcrumb(),
        };
        match self.items.entry(product.name.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    /// Removes every entry for the given product id. Returns whether anything was removed.
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|_, entry| entry.product_id != product_id);
        before != self.items.len()
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Entries ordered by display name.
    pub fn iter(&self) -> impl Iterator<Item = &CartEntry> {
        self.items.values()
    }

    /// Sum of entry prices
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.values().map(|entry| entry.price).sum()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything remembered about one user between events.
#[derive(Debug, Default)]
pub struct Session {
    /// Active dialogue
    pub conversation: Conversation,
    /// Shopping cart
    pub cart: Cart,
}

impl Session {
    /// Aborts any dialogue. Returns the state that was active, if any.
    pub fn cancel(&mut self) -> Option<Conversation> {
        let previous = std::mem::take(&mut self.conversation);
        previous.is_active().then_some(previous)
    }
}

/// Concurrent map of per-user sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Arc<Mutex<Session>>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the user's session, creating an empty one on first use.
    ///
    /// Hold the guard for the whole event so the user's dialogue steps never interleave.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<Session> {
        let slot = Arc::clone(self.sessions.entry(user_id).or_default().value());
        slot.lock_owned().await
    }

    /// Number of users with a session
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no user has a session yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::test_catalog;
    use std::time::Duration;

    #[test]
    fn test_cart_add_replace_remove() {
        let catalog = test_catalog();
        let mut cart = Cart::default();

        cart.add(catalog.find_by_id("ffs1_100").unwrap());
        cart.add(catalog.find_by_id("pubg_60").unwrap());
        cart.add(catalog.find_by_id("pubg_60").unwrap());
        assert_eq!(cart.len(), 2);
        assert!((cart.total() - 1.85).abs() < 1e-9);

        assert!(cart.remove_product("pubg_60"));
        assert!(!cart.remove_product("pubg_60"));
        assert_eq!(cart.len(), 1);

        let entry = cart.iter().next().unwrap();
        assert_eq!(entry.name, "100 Gems");
        assert_eq!(entry.breadcrumb, "Games > Free Fire > Free Fire Server 1");

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0.0);
    }

    #[test]
    fn test_cart_add_returns_replacement() {
        let catalog = test_catalog();
        let mut cart = Cart::default();

        let first = cart.add(catalog.find_by_id("pubg_60").unwrap()).clone();
        assert_eq!(first.name, "60 UC");
        assert_eq!(first.product_id, "pubg_60");

        let again = cart.add(catalog.find_by_id("pubg_60").unwrap());
        assert_eq!(again, &first);
        assert_eq!(cart.len(), 1);

        let other = cart.add(catalog.find_by_id("ffs2_100").unwrap());
        assert_eq!(other.name, "100 Gems (Server 2)");
        assert_eq!(other.breadcrumb, "Games > Free Fire > Free Fire Server 2");
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_cancel_reports_previous_state() {
        let mut session = Session::default();
        assert!(session.cancel().is_none());

        session.conversation = Conversation::AwaitingAmount {
            method: "Cash".to_string(),
        };
        let previous = session.cancel();
        assert!(matches!(previous, Some(Conversation::AwaitingAmount { .. })));
        assert_eq!(session.conversation, Conversation::Idle);
    }

    #[tokio::test]
    async fn test_lock_returns_same_session() {
        let store = SessionStore::new();

        {
            let mut session = store.lock(1).await;
            session.conversation = Conversation::AwaitingBroadcast;
        }

        let session = store.lock(1).await;
        assert_eq!(session.conversation, Conversation::AwaitingBroadcast);
        drop(session);

        let other = store.lock(2).await;
        assert_eq!(other.conversation, Conversation::Idle);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_serialises_same_user() {
        let store = Arc::new(SessionStore::new());
        let guard = store.lock(1).await;

        let waiting = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                let _session = store.lock(1).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        // A different user is not blocked
        let _other = store.lock(2).await;

        drop(guard);
        waiting.await.unwrap();
    }
}
