//! The durable document store contract (§3, §6).
//!
//! `Store` is the only thing the chat and video engines know about
//! persistence. It is injected as a trait object (per the design notes'
//! "inject as capabilities" guidance) rather than reached for as a
//! global singleton, so engines can be exercised in tests against
//! [`memory::MemoryStore`] without a running PostgreSQL instance.

pub mod codes;
pub mod error;
pub mod memory;
pub mod pg;
pub mod traits;

pub use error::StoreError;
pub use traits::{NewChatMessage, NewChatRoom, NewVideoRoom, Store};
