//! An in-process host: runs its response pipeline and records what it
//! delivers and emits. Used to embed Improv without a chat adapter.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

use super::{
    Brain, EventListener, Host, HostEvent, MemoryBrain, Response, ResponseMethod,
    ResponseMiddleware,
};
use crate::error::MiddlewareError;

/// A string the host delivered to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub room: Option<String>,
    pub text: String,
}

pub struct MemoryHost {
    name: String,
    brain: Arc<dyn Brain>,
    middleware: RwLock<Vec<Arc<dyn ResponseMiddleware>>>,
    listeners: RwLock<Vec<(String, EventListener)>>,
    events: Mutex<Vec<HostEvent>>,
    deliveries: Mutex<Vec<Delivery>>,
}

impl MemoryHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_brain(name, Arc::new(MemoryBrain::new()))
    }

    pub fn with_brain(name: impl Into<String>, brain: Arc<dyn Brain>) -> Self {
        Self {
            name: name.into(),
            brain,
            middleware: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Run `response` through the pipeline and deliver its strings.
    ///
    /// Replies are addressed as `@name text`.
    pub async fn send(&self, mut response: Response) -> Result<Vec<String>, MiddlewareError> {
        let chain: Vec<_> = self.middleware.read().clone();
        for middleware in chain {
            middleware.call(&mut response).await?;
        }

        let lines: Vec<String> = match response.method {
            ResponseMethod::Send => response.strings,
            ResponseMethod::Reply => {
                let name = &response.message.user.name;
                response
                    .strings
                    .into_iter()
                    .map(|text| format!("@{name} {text}"))
                    .collect()
            }
        };

        debug!(host = %self.name, count = lines.len(), "delivering response");
        self.deliveries.lock().extend(lines.iter().map(|text| Delivery {
            room: response.message.room.clone(),
            text: text.clone(),
        }));
        Ok(lines)
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware.read().len()
    }
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHost")
            .field("name", &self.name)
            .field("middleware", &self.middleware_count())
            .finish_non_exhaustive()
    }
}

impl Host for MemoryHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn brain(&self) -> Arc<dyn Brain> {
        Arc::clone(&self.brain)
    }

    fn emit(&self, event: HostEvent) {
        let listeners: Vec<EventListener> = self
            .listeners
            .read()
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&event);
        }
        self.events.lock().push(event);
    }

    fn on(&self, event: &str, listener: EventListener) {
        self.listeners.write().push((event.to_owned(), listener));
    }

    fn add_response_middleware(&self, middleware: Arc<dyn ResponseMiddleware>) {
        self.middleware.write().push(middleware);
    }
}
