//! # Improv Core
//!
//! Lets a chat bot write outgoing messages as templates populated from
//! contextual data, without knowing where that data lives.
//!
//! ## Core Components
//!
//! - **data_store**: Remembered facts, global and per user
//! - **merge_engine**: Composes persisted, global, extension, user and context data
//! - **template**: Renders `${ this.path }` placeholders with graceful fallbacks
//! - **pipeline**: Response middleware rendering every outgoing message
//! - **lifecycle**: Keeps exactly one engine bound to the host
//! - **events**: Logging and error-reporting capability
//!
//! ## Merge Order
//!
//! Persisted data, then global data, then extensions in registration order,
//! then the user's data, then the call context. Later sources win.

pub mod data_store;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod merge_engine;
pub mod pipeline;
pub mod template;

pub use data_store::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use lifecycle::*;
pub use merge_engine::*;
pub use pipeline::*;
pub use template::*;
