//! Conversation session storage: one persistent thread handle per user.
//!
//! Sessions live in a JSON index file. Creation is guarded by a per-user
//! lock so two concurrent dispatches for the same user never race a thread
//! into existence twice.

pub mod error;
pub mod identity;
pub mod store;

pub use {
    error::{Error, Result},
    identity::normalize_user_id,
    store::{SessionEntry, SessionStore},
};
