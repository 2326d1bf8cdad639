//! Singleton Lifecycle - at most one engine, bound to one host at a time.
//!
//! The runtime is owned by the caller rather than living in a global:
//! - **Unbound**: no engine exists
//! - **Bound**: one engine exists, tied to the most recent host

use improv_data::Host;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::engine::{Improv, ENGINE_NAME};
use crate::error::{ImprovError, Result};
use crate::events::{Reporter, TracingReporter};
use crate::pipeline::{EngineSlot, TemplateMiddleware};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
}

pub struct ImprovRuntime {
    instance: Option<Arc<Improv>>,
    slot: EngineSlot,
    installed: Vec<Weak<dyn Host>>,
    reporter: Arc<dyn Reporter>,
}

impl Default for ImprovRuntime {
    fn default() -> Self {
        Self::with_reporter(Arc::new(TracingReporter))
    }
}

impl ImprovRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime whose engines report through `reporter`.
    pub fn with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            instance: None,
            slot: EngineSlot::new(),
            installed: Vec::new(),
            reporter,
        }
    }

    /// Bind to `host`.
    ///
    /// Unbound: creates the engine and installs the response middleware on
    /// `host`, unless an earlier engine already installed it there. Bound:
    /// points the existing engine at `host` and returns it; no middleware
    /// is installed.
    pub fn use_host(&mut self, host: Arc<dyn Host>) -> Result<Arc<Improv>> {
        if let Some(engine) = &self.instance {
            engine.rebind(host);
            return Ok(Arc::clone(engine));
        }

        let engine = Arc::new(Improv::with_reporter(
            ENGINE_NAME,
            Arc::clone(&host),
            Arc::clone(&self.reporter),
        )?);
        self.slot.fill(&engine);
        self.install(&host);
        info!(engine = %engine.id(), host = host.name(), "engine bound");

        self.instance = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Discard the engine with all its data, extensions and options.
    /// Returns the discarded engine, if there was one.
    ///
    /// Installed middleware stops rendering at once, even while the
    /// returned engine is still alive.
    pub fn reset(&mut self) -> Option<Arc<Improv>> {
        self.slot.clear();
        let discarded = self.instance.take();
        if let Some(engine) = &discarded {
            info!(engine = %engine.id(), "engine reset");
        }
        discarded
    }

    pub fn instance(&self) -> Option<&Arc<Improv>> {
        self.instance.as_ref()
    }

    /// The bound engine, or [`ImprovError::Unbound`].
    pub fn engine(&self) -> Result<&Arc<Improv>> {
        self.instance.as_ref().ok_or(ImprovError::Unbound)
    }

    pub fn state(&self) -> BindingState {
        match self.instance {
            Some(_) => BindingState::Bound,
            None => BindingState::Unbound,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.state() == BindingState::Bound
    }

    fn install(&mut self, host: &Arc<dyn Host>) {
        self.installed.retain(|known| known.strong_count() > 0);
        let known = self.installed.iter().filter_map(Weak::upgrade).any(|known| {
            std::ptr::addr_eq(Arc::as_ptr(&known), Arc::as_ptr(host))
        });
        if known {
            debug!(host = host.name(), "response middleware already installed");
            return;
        }

        host.add_response_middleware(Arc::new(TemplateMiddleware::new(self.slot.clone())));
        self.installed.push(Arc::downgrade(host));
    }
}

impl Drop for ImprovRuntime {
    fn drop(&mut self) {
        self.slot.clear();
    }
}

impl std::fmt::Debug for ImprovRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImprovRuntime")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
