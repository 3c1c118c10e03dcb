//! Routes notification responses to handlers keyed by payload type.
//!
//! The payload's `type` field selects the handler. Unknown or missing types
//! fall through to a logged default. Handlers can be added or replaced at
//! runtime without touching the notification center.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use dc_core::constants::notification_types;

use crate::platform::NotificationResponse;

/// Handler invoked for a routed response.
pub type RouteHandler = Arc<dyn Fn(&NotificationResponse) + Send + Sync>;

/// Outcome of dispatching one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseRoute {
    /// A handler registered for this type ran.
    Handled(String),
    /// No handler matched. Carries the payload type, if any.
    Unrouted(Option<String>),
}

/// Registry of response handlers.
pub struct ResponseRouter {
    routes: RwLock<HashMap<String, RouteHandler>>,
}

impl ResponseRouter {
    /// An empty router.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// A router with log-only handlers for the built-in payload types.
    pub fn with_default_routes() -> Self {
        let router = Self::new();
        for kind in notification_types::ALL {
            let kind = *kind;
            router.register(kind, move |response: &NotificationResponse| {
                info!(
                    "notification response: {kind} {} (action {})",
                    response.notification.id, response.action
                );
            });
        }
        router
    }

    /// Register `handler` for `kind`. Returns true if it replaced a handler.
    pub fn register<F>(&self, kind: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&NotificationResponse) + Send + Sync + 'static,
    {
        let kind = kind.into();
        debug!("response router: registering route {kind}");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, Arc::new(handler))
            .is_some()
    }

    /// Remove the handler for `kind`. Returns true if one was registered.
    pub fn unregister(&self, kind: &str) -> bool {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(kind)
            .is_some()
    }

    /// Run the handler matching the response's payload type.
    pub fn dispatch(&self, response: &NotificationResponse) -> ResponseRoute {
        let kind = response.kind().map(str::to_string);
        let handler = kind.as_deref().and_then(|k| {
            self.routes
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(k)
                .cloned()
        });

        match (handler, kind) {
            (Some(handler), Some(kind)) => {
                handler(response);
                ResponseRoute::Handled(kind)
            }
            (_, kind) => {
                debug!(
                    "notification response {} has no route for type {:?}",
                    response.notification.id, kind
                );
                ResponseRoute::Unrouted(kind)
            }
        }
    }

    /// Registered payload types, sorted.
    pub fn routes(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        kinds.sort();
        kinds
    }
}

impl Default for ResponseRouter {
    fn default() -> Self {
        Self::new()
    }
}
