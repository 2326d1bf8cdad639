//! The Improv engine - one instance per host connection.

use improv_data::{
    into_record, EngineConfig, EventListener, Host, HostEvent, Record, Value, ERROR_EVENT,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::data_store::DataStore;
use crate::error::{ImprovError, Result};
use crate::events::{LogLevel, Reporter, TracingReporter};
use crate::merge_engine::{Extension, ExtensionRegistry, MergeContext, MergeLayers};
use crate::template::{Renderer, Template};

/// Name the engine registers under.
pub const ENGINE_NAME: &str = "improv";

/// Brain key persisted data is read from.
pub const BRAIN_KEY: &str = "improv";

/// Unique identifier for engine instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineId(pub Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remembered data, extensions and options, merged and rendered into
/// outgoing messages.
///
/// The engine is shared as `Arc<Improv>` between its owner and the response
/// pipeline. No lock is held across the brain read in [`Improv::merge_data`].
pub struct Improv {
    id: EngineId,
    name: String,
    host: RwLock<Arc<dyn Host>>,
    reporter: Arc<dyn Reporter>,
    config: RwLock<EngineConfig>,
    store: RwLock<DataStore>,
    extensions: RwLock<ExtensionRegistry>,
}

impl Improv {
    /// Create an engine reporting through `tracing`.
    pub fn new(name: impl Into<String>, host: Arc<dyn Host>) -> Result<Self> {
        Self::with_reporter(name, host, Arc::new(TracingReporter))
    }

    /// Create an engine with a custom reporter.
    ///
    /// An empty name is reported to the host's `"error"` event and returned.
    pub fn with_reporter(
        name: impl Into<String>,
        host: Arc<dyn Host>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let id = EngineId::new();
        let name = name.into();
        if name.trim().is_empty() {
            let error = ImprovError::Construction {
                engine: id.to_string(),
                message: "module requires a name".to_owned(),
            };
            reporter.report_error(&error);
            host.emit(HostEvent::error(Some(id.0), error.to_string()));
            return Err(error);
        }

        debug!(engine = %id, name = %name, host = host.name(), "engine created");
        Ok(Self {
            id,
            name,
            host: RwLock::new(host),
            reporter,
            config: RwLock::new(EngineConfig::default()),
            store: RwLock::new(DataStore::new()),
            extensions: RwLock::new(ExtensionRegistry::new()),
        })
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> Arc<dyn Host> {
        self.host.read().clone()
    }

    /// Point the engine at a new host connection.
    pub(crate) fn rebind(&self, host: Arc<dyn Host>) {
        info!(engine = %self.id, host = host.name(), "engine rebound");
        *self.host.write() = host;
    }

    /// Merge `options` into the current configuration.
    pub fn configure(&self, options: Record) {
        debug!(engine = %self.id, keys = ?options.keys().collect::<Vec<_>>(), "configure");
        self.config.write().merge(options);
    }

    /// Merge options read from a TOML document.
    pub fn configure_from_toml(&self, document: &str) -> Result<()> {
        let options = EngineConfig::options_from_toml(document).map_err(|e| self.fail(e.into()))?;
        self.configure(options);
        Ok(())
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Register a data provider, optionally scoped to a path. Chainable.
    pub fn extend(
        &self,
        compute: impl Fn() -> Record + Send + Sync + 'static,
        scope: Option<&str>,
    ) -> &Self {
        debug!(engine = %self.id, scope = ?scope, "extension registered");
        self.extensions
            .write()
            .register(Extension::new(compute, scope));
        self
    }

    /// Scopes of the registered extensions, in registration order.
    pub fn extensions(&self) -> Vec<Option<String>> {
        self.extensions.read().scopes()
    }

    /// Remember `value` at `path` for everyone.
    pub fn remember(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let result = self.store.write().remember(path, value.into());
        result.map_err(|e| self.fail(e.into()))?;
        debug!(engine = %self.id, path, "remembered");
        Ok(())
    }

    /// Forget the value at `path`, returning it.
    pub fn forget(&self, path: &str) -> Result<Option<Value>> {
        let result = self.store.write().forget(path);
        let forgotten = result.map_err(|e| self.fail(e.into()))?;
        debug!(engine = %self.id, path, found = forgotten.is_some(), "forgot");
        Ok(forgotten)
    }

    /// Remember `value` at `path` for one user.
    pub fn remember_for_user(&self, user_id: &str, path: &str, value: impl Into<Value>) -> Result<()> {
        let result = self
            .store
            .write()
            .remember_for_user(user_id, path, value.into());
        result.map_err(|e| self.fail(e.into()))?;
        debug!(engine = %self.id, user = user_id, path, "remembered for user");
        Ok(())
    }

    /// Forget a user's value at `path`. Unknown users are a no-op.
    pub fn forget_for_user(&self, user_id: &str, path: &str) -> Result<Option<Value>> {
        let result = self.store.write().forget_for_user(user_id, path);
        let forgotten = result.map_err(|e| self.fail(e.into()))?;
        debug!(engine = %self.id, user = user_id, path, found = forgotten.is_some(), "forgot for user");
        Ok(forgotten)
    }

    /// Snapshot of the global data.
    pub fn data(&self) -> Record {
        self.store.read().global().clone()
    }

    /// Snapshot of one user's data.
    pub fn user_data(&self, user_id: &str) -> Option<Record> {
        self.store.read().user(user_id).cloned()
    }

    /// Compose persisted, global, extension, user and context data.
    ///
    /// `paths` restricts which scoped extensions contribute; `None` or an
    /// empty slice includes all of them. Brain failures are returned.
    pub async fn merge_data(
        &self,
        context: Option<&MergeContext>,
        paths: Option<&[&str]>,
    ) -> Result<Record> {
        let save = self.config.read().save();
        let persisted = if save { self.load_persisted().await? } else { None };

        let context = context.cloned().unwrap_or_default();
        let user_id = context.user_id();
        let (global, user) = {
            let store = self.store.read();
            let user = user_id.as_deref().and_then(|id| store.user(id)).cloned();
            (store.global().clone(), user)
        };
        let extensions = self.extensions.read().matching(paths);

        let layers = MergeLayers {
            persisted,
            global,
            extensions: extensions.iter().map(Extension::compute).collect(),
            user,
        };
        debug!(
            engine = %self.id,
            sources = layers.source_count(),
            user = ?user_id,
            "merging data"
        );
        Ok(layers.compose(context))
    }

    /// Render `template` against the global data.
    pub fn parse(&self, template: &Template) -> Result<Vec<String>> {
        let data = self.data();
        self.parse_with(template, &data)
    }

    /// Render `template` against `data`.
    pub fn parse_with(&self, template: &Template, data: &Record) -> Result<Vec<String>> {
        let renderer = Renderer::from_config(&self.config.read());
        let renderer = renderer.map_err(|e| self.fail(e))?;
        Ok(renderer.render(template, data))
    }

    /// Emit an event on the host's bus, tagged with this engine's id.
    pub fn emit(&self, event: &str, payload: Value) {
        self.host()
            .emit(HostEvent::new(event, Some(self.id.0), payload));
    }

    /// Listen for host events emitted by this engine only.
    pub fn on(&self, event: &str, listener: impl Fn(&HostEvent) + Send + Sync + 'static) {
        let id = self.id.0;
        let filtered: EventListener = Arc::new(move |host_event: &HostEvent| {
            if host_event.source == Some(id) {
                listener(host_event);
            }
        });
        self.host().on(event, filtered);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.reporter.log(level, message);
    }

    async fn load_persisted(&self) -> Result<Option<Record>> {
        let brain = self.host().brain();
        let stored = brain
            .get(BRAIN_KEY)
            .await
            .map_err(|e| self.fail(e.into()))?;

        Ok(match stored {
            None | Some(Value::Null) => None,
            Some(value) => {
                let record = into_record(value);
                if record.is_none() {
                    warn!(engine = %self.id, key = BRAIN_KEY, "persisted data is not a record, ignoring");
                }
                record
            }
        })
    }

    /// Report `error` to the reporter and the host, then hand it back.
    ///
    /// Callers must not hold a store or config guard: host listeners may
    /// call back into the engine.
    fn fail(&self, error: ImprovError) -> ImprovError {
        self.reporter.report_error(&error);
        self.emit(ERROR_EVENT, serde_json::json!({ "message": error.to_string() }));
        error
    }
}

impl std::fmt::Debug for Improv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Improv")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
