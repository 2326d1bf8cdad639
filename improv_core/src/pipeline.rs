//! Pipeline Adapter - renders outgoing responses before the host delivers them.

use async_trait::async_trait;
use improv_data::{MiddlewareError, Response, ResponseMiddleware};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::engine::{Improv, ENGINE_NAME};
use crate::merge_engine::MergeContext;
use crate::template::Template;

/// Handle to the engine a runtime currently holds.
///
/// Clones share one slot. The slot only ever points at the live engine:
/// clearing it detaches every middleware holding a clone, whoever else
/// still owns the old engine.
#[derive(Debug, Clone, Default)]
pub struct EngineSlot(Arc<RwLock<Weak<Improv>>>);

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&self, engine: &Arc<Improv>) {
        *self.0.write() = Arc::downgrade(engine);
    }

    pub fn clear(&self) {
        *self.0.write() = Weak::new();
    }

    pub fn current(&self) -> Option<Arc<Improv>> {
        self.0.read().upgrade()
    }
}

/// Response middleware merging data for each response and rendering its strings.
///
/// Resolves the engine through its [`EngineSlot`] on every call. An empty
/// slot lets responses pass through untouched.
#[derive(Debug)]
pub struct TemplateMiddleware {
    slot: EngineSlot,
}

impl TemplateMiddleware {
    pub fn new(slot: EngineSlot) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl ResponseMiddleware for TemplateMiddleware {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn call(&self, response: &mut Response) -> Result<(), MiddlewareError> {
        let Some(engine) = self.slot.current() else {
            return Ok(());
        };

        let context = MergeContext::for_response(response);
        let data = engine.merge_data(Some(&context), None).await?;
        let template = Template::new(std::mem::take(&mut response.strings));
        response.strings = engine.parse_with(&template, &data)?;

        debug!(engine = %engine.id(), count = response.strings.len(), "rendered response");
        Ok(())
    }
}
