//! Contracts of the chat host Improv plugs into.
//!
//! The host owns the event bus, durable storage ("brain") and the outgoing
//! response pipeline. Improv only consumes these through the traits below.

mod brain;
mod memory;

pub use brain::*;
pub use memory::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::MiddlewareError;
use crate::record::{Record, Value};

/// Name of the event hosts use for error reporting.
pub const ERROR_EVENT: &str = "error";

/// A chat user as the host knows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    /// Any other fields the host attaches.
    #[serde(flatten)]
    pub extra: Record,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            room: None,
            extra: Record::new(),
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }
}

/// The incoming message a response answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub user: User,
    pub room: Option<String>,
    pub text: String,
}

impl Message {
    pub fn new(user: User, text: impl Into<String>) -> Self {
        let room = user.room.clone();
        Self {
            user,
            room,
            text: text.into(),
        }
    }
}

/// How the host delivers a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMethod {
    #[default]
    Send,
    /// Addressed to the user who wrote the message.
    Reply,
}

/// An outgoing response travelling through the host's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub message: Message,

    /// Outgoing string segments, delivered in order.
    pub strings: Vec<String>,

    pub method: ResponseMethod,
}

impl Response {
    pub fn new(message: Message, strings: Vec<String>) -> Self {
        Self {
            message,
            strings,
            method: ResponseMethod::Send,
        }
    }

    pub fn with_method(mut self, method: ResponseMethod) -> Self {
        self.method = method;
        self
    }

    /// The user this response answers.
    pub fn user(&self) -> &User {
        &self.message.user
    }
}

/// An event on the host's bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub name: String,

    /// Emitting module instance, if any.
    pub source: Option<Uuid>,

    pub payload: Value,
}

impl HostEvent {
    pub fn new(name: impl Into<String>, source: Option<Uuid>, payload: Value) -> Self {
        Self {
            name: name.into(),
            source,
            payload,
        }
    }

    /// An `"error"` event carrying a message.
    pub fn error(source: Option<Uuid>, message: impl Into<String>) -> Self {
        Self::new(
            ERROR_EVENT,
            source,
            serde_json::json!({ "message": message.into() }),
        )
    }
}

/// Callback fired for host events.
pub type EventListener = Arc<dyn Fn(&HostEvent) + Send + Sync>;

/// A step in the host's outgoing-response pipeline.
///
/// Returning `Ok` hands the (possibly rewritten) response to the next step;
/// returning `Err` stops the response from being delivered.
#[async_trait]
pub trait ResponseMiddleware: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, response: &mut Response) -> Result<(), MiddlewareError>;
}

/// The host connection.
pub trait Host: Send + Sync {
    fn name(&self) -> &str;

    /// Durable key/value storage.
    fn brain(&self) -> Arc<dyn Brain>;

    fn emit(&self, event: HostEvent);

    /// Listen for events named `event`.
    fn on(&self, event: &str, listener: EventListener);

    /// Append a step to the outgoing-response pipeline.
    fn add_response_middleware(&self, middleware: Arc<dyn ResponseMiddleware>);
}
