//! Extensions - computed data providers folded into every merge.

use improv_data::{Path, Record};
use std::sync::Arc;

/// Computation producing extension data.
pub type ExtensionFn = Arc<dyn Fn() -> Record + Send + Sync>;

/// A registered data provider, optionally scoped to a path.
#[derive(Clone)]
pub struct Extension {
    compute: ExtensionFn,
    scope: Option<String>,
}

impl Extension {
    pub fn new(compute: impl Fn() -> Record + Send + Sync + 'static, scope: Option<&str>) -> Self {
        Self {
            compute: Arc::new(compute),
            scope: scope.map(str::to_owned),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Run the computation.
    pub fn compute(&self) -> Record {
        (self.compute)()
    }

    /// Whether this extension contributes to a merge requesting `paths`.
    ///
    /// Unscoped extensions always match, as does every extension when no
    /// paths are requested. Otherwise one requested path must equal the scope,
    /// or be a segment-wise prefix of it, or extend it.
    pub fn matches(&self, paths: &[&str]) -> bool {
        let Some(scope) = &self.scope else {
            return true;
        };
        if paths.is_empty() {
            return true;
        }
        let Ok(scope) = Path::parse(scope) else {
            return false;
        };

        paths
            .iter()
            .filter_map(|path| Path::parse(path).ok())
            .any(|path| scope.overlaps(&path))
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Registered extensions in registration order. Later ones win on conflict.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Extension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// Extensions to include for a merge, in registration order.
    pub fn matching(&self, paths: Option<&[&str]>) -> Vec<Extension> {
        let paths = paths.unwrap_or_default();
        self.extensions
            .iter()
            .filter(|extension| extension.matches(paths))
            .cloned()
            .collect()
    }

    /// Scope of each extension, in registration order.
    pub fn scopes(&self) -> Vec<Option<String>> {
        self.extensions
            .iter()
            .map(|extension| extension.scope.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn returning(value: Value) -> impl Fn() -> Record + Send + Sync + 'static {
        move || match &value {
            Value::Object(map) => map.clone(),
            _ => Record::new(),
        }
    }

    #[test]
    fn test_unscoped_always_matches() {
        let extension = Extension::new(returning(json!({"custom": 1})), None);
        assert!(extension.matches(&[]));
        assert!(extension.matches(&["anything"]));
    }

    #[test]
    fn test_scoped_matching() {
        let extension = Extension::new(returning(json!({"test": {"foo": "bar"}})), Some("test.foo"));
        assert!(extension.matches(&[]));
        assert!(extension.matches(&["test.foo"]));
        assert!(extension.matches(&["test"]));
        assert!(extension.matches(&["test.foo.bar"]));
        assert!(extension.matches(&["something.else", "test"]));
        assert!(!extension.matches(&["something.else"]));
        assert!(!extension.matches(&["tes"]));
    }

    #[test]
    fn test_compute() {
        let extension = Extension::new(returning(json!({"custom1": "foo"})), None);
        assert_eq!(extension.compute().get("custom1"), Some(&json!("foo")));
    }

    #[test]
    fn test_registry_preserves_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Extension::new(returning(json!({})), None));
        registry.register(Extension::new(returning(json!({})), Some("a.path")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.scopes(), vec![None, Some("a.path".to_owned())]);
    }

    #[test]
    fn test_registry_matching_filters() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Extension::new(returning(json!({"a": 1})), None));
        registry.register(Extension::new(returning(json!({"b": 2})), Some("test.foo")));

        assert_eq!(registry.matching(None).len(), 2);
        assert_eq!(registry.matching(Some(&[][..])).len(), 2);
        assert_eq!(registry.matching(Some(&["test"][..])).len(), 2);

        let filtered = registry.matching(Some(&["something.else"][..]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].scope(), None);
    }
}
