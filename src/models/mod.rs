//! Domain models for drafter.
//!
//! # Core Concepts
//!
//! ## Persistent Entities
//!
//! - [`Report`]: A generated report together with the parameters it was produced from.
//!   Reports form the history that semantic search ranks against.
//! - [`ReferenceDocument`]: Uploaded source material, chunked and indexed for retrieval.
//! - [`Outline`]: A stored [`crate::document::Document`] that outline commands act on.
//!
//! ## Ephemeral Entities
//!
//! These live only in process memory and are lost on restart:
//!
//! - [`ConversationState`]: One elicitation dialogue, keyed by an opaque session id.

mod conversation;
mod outline;
mod reference;
mod report;

pub use conversation::*;
pub use outline::*;
pub use reference::*;
pub use report::*;
