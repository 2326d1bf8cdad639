//! Merge Engine - composes every data source into one record.
//!
//! Sources are deep merged in a fixed order, each overriding the one before:
//! 1. **Persisted**: the brain snapshot, when saving is enabled
//! 2. **Global**: remembered facts
//! 3. **Extensions**: computed data, in registration order
//! 4. **User**: facts remembered for the user the context resolves to
//! 5. **Context**: call-scoped data, with the resolved user surfaced as `user`

mod extension;

pub use extension::*;

use improv_data::record::{self, Record, Value};
use improv_data::{Response, User};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Call-scoped data folded into a single merge with the highest precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeContext(Record);

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{ user, response }` for an outgoing response.
    pub fn for_response(response: &Response) -> Self {
        Self::new().with_user(response.user()).with_response(response)
    }

    pub fn with_user(self, user: &User) -> Self {
        self.with("user", json!(user))
    }

    pub fn with_response(self, response: &Response) -> Self {
        self.with("response", json!(response))
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// The user this context is about: `user`, else `response.message.user`.
    pub fn user(&self) -> Option<&Value> {
        self.0
            .get("user")
            .or_else(|| record::get(&self.0, "response.message.user"))
    }

    /// Id of the resolved user, when it is a string or a number.
    pub fn user_id(&self) -> Option<String> {
        match self.user()?.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> &Record {
        &self.0
    }

    /// The context as merged: the resolved user is injected as `user`
    /// when the context does not carry one itself.
    pub fn into_record(self) -> Record {
        let user = if self.0.contains_key("user") {
            None
        } else {
            self.user().cloned()
        };

        let mut context = self.0;
        if let Some(user) = user {
            context.insert("user".to_owned(), user);
        }
        context
    }
}

impl From<Record> for MergeContext {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

/// Snapshots of every source taken for one merge.
#[derive(Debug, Clone, Default)]
pub struct MergeLayers {
    pub persisted: Option<Record>,
    pub global: Record,

    /// Outputs of the matching extensions, in registration order.
    pub extensions: Vec<Record>,

    pub user: Option<Record>,
}

impl MergeLayers {
    /// Deep merge the layers and then `context`, later sources winning.
    pub fn compose(self, context: MergeContext) -> Record {
        let mut merged = self.persisted.unwrap_or_default();
        record::merge_records(&mut merged, self.global);
        for output in self.extensions {
            record::merge_records(&mut merged, output);
        }
        if let Some(user) = self.user {
            record::merge_records(&mut merged, user);
        }
        record::merge_records(&mut merged, context.into_record());
        merged
    }

    /// Number of layers that contribute data.
    pub fn source_count(&self) -> usize {
        usize::from(self.persisted.is_some())
            + usize::from(!self.global.is_empty())
            + self.extensions.len()
            + usize::from(self.user.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use improv_data::Message;

    fn record(value: Value) -> Record {
        record::into_record(value).unwrap()
    }

    fn response() -> Response {
        let user = User::new("1", "tester").with_room("testing");
        Response::new(Message::new(user, "test"), vec!["hi".into()])
    }

    #[test]
    fn test_context_user_from_user_key() {
        let context = MergeContext::new().with_user(&User::new("7", "frendo"));
        assert_eq!(context.user_id().as_deref(), Some("7"));
    }

    #[test]
    fn test_context_user_from_response() {
        let context = MergeContext::new().with_response(&response());
        assert_eq!(context.user_id().as_deref(), Some("1"));

        let merged = context.into_record();
        assert_eq!(merged.get("user"), Some(&json!(response().user())));
        assert!(merged.contains_key("response"));
    }

    #[test]
    fn test_context_keeps_explicit_user() {
        let context = MergeContext::new()
            .with("user", json!({"name": "frendo"}))
            .with_response(&response());

        assert_eq!(context.user_id(), None);
        assert_eq!(
            context.into_record().get("user"),
            Some(&json!({"name": "frendo"}))
        );
    }

    #[test]
    fn test_context_numeric_user_id() {
        let context = MergeContext::from(record(json!({"user": {"id": 42}})));
        assert_eq!(context.user_id().as_deref(), Some("42"));
    }

    #[test]
    fn test_empty_context_has_no_user() {
        let context = MergeContext::new();
        assert!(context.user().is_none());
        assert!(context.into_record().is_empty());
    }

    #[test]
    fn test_compose_precedence() {
        let layers = MergeLayers {
            persisted: Some(record(json!({"site": {"owner": "Hubot", "name": "old"}, "a": "persisted"}))),
            global: record(json!({"site": {"name": "Hub"}, "b": "global"})),
            extensions: vec![
                record(json!({"a": "first", "custom": "one"})),
                record(json!({"custom": "two"})),
            ],
            user: Some(record(json!({"site": {"nickname": "Hubby"}, "b": "user"}))),
        };
        assert_eq!(layers.source_count(), 5);

        let merged = layers.compose(MergeContext::from(record(json!({"b": "context"}))));

        assert_eq!(
            Value::Object(merged),
            json!({
                "site": {"owner": "Hubot", "name": "Hub", "nickname": "Hubby"},
                "a": "first",
                "b": "context",
                "custom": "two"
            })
        );
    }

    #[test]
    fn test_compose_context_deep_merges() {
        let layers = MergeLayers {
            extensions: vec![record(json!({"user": {"type": "human"}}))],
            ..MergeLayers::default()
        };

        let merged = layers.compose(MergeContext::from(record(json!({"user": {"name": "frendo"}}))));
        assert_eq!(
            Value::Object(merged),
            json!({"user": {"name": "frendo", "type": "human"}})
        );
    }

    #[test]
    fn test_compose_empty() {
        let layers = MergeLayers::default();
        assert_eq!(layers.source_count(), 0);
        assert!(layers.compose(MergeContext::new()).is_empty());
    }
}
