//! All-or-nothing event subscription
//!
//! The four event classes are registered as one unit. A failure part way
//! through rolls back the classes already registered, so the set is either
//! fully subscribed or not subscribed at all. Both directions are idempotent.
//!
//! The internal lock serializes subscribe and unsubscribe, so lifecycle
//! calls from the caller's context and the monitor task never interleave.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::traits::{BusClient, EventClass};

/// The network service event subscription
pub struct SubscriptionSet {
    bus: Arc<dyn BusClient>,
    subscribed: Mutex<bool>,
}

impl SubscriptionSet {
    /// Create an unsubscribed set
    pub fn new(bus: Arc<dyn BusClient>) -> Self {
        Self {
            bus,
            subscribed: Mutex::new(false),
        }
    }

    /// Whether all classes are currently registered
    pub async fn is_subscribed(&self) -> bool {
        *self.subscribed.lock().await
    }

    /// Register every event class
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the set was registered by this call
    /// - `Ok(false)`: already subscribed, nothing was sent
    /// - `Err(Error)`: a registration failed; earlier ones were rolled back
    pub async fn subscribe_all(&self) -> Result<bool> {
        let mut subscribed = self.subscribed.lock().await;
        if *subscribed {
            return Ok(false);
        }

        let mut registered = Vec::with_capacity(EventClass::ALL.len());
        for class in EventClass::ALL {
            if let Err(e) = self.bus.subscribe(class).await {
                warn!("Failed to subscribe to {:?}: {}", class, e);
                for done in registered.into_iter().rev() {
                    if let Err(e) = self.bus.unsubscribe(done).await {
                        warn!("Rollback of {:?} subscription failed: {}", done, e);
                    }
                }
                return Err(e);
            }
            registered.push(class);
        }

        *subscribed = true;
        info!("Subscribed to network service events");
        Ok(true)
    }

    /// Drop every registration
    ///
    /// Every class is attempted even if one fails; the first failure is
    /// returned after the set is marked unsubscribed.
    pub async fn unsubscribe_all(&self) -> Result<bool> {
        let mut subscribed = self.subscribed.lock().await;
        if !*subscribed {
            return Ok(false);
        }

        let mut first_error = None;
        for class in EventClass::ALL {
            if let Err(e) = self.bus.unsubscribe(class).await {
                warn!("Failed to unsubscribe from {:?}: {}", class, e);
                first_error.get_or_insert(e);
            }
        }

        *subscribed = false;
        info!("Unsubscribed from network service events");

        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }
}
