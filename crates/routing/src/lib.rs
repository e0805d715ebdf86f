//! Map inbound messages to handlers: the closed category set and the single
//! category → handler lookup table consumed everywhere.
//!
//! Every classification result resolves to a [`Category`]; every category
//! resolves to exactly one [`HandlerConfig`]. There are no other dispatch
//! decision points.

pub mod category;
pub mod handlers;

pub use {
    category::Category,
    handlers::{HandlerConfig, classifier_handler, handler_for, handlers},
};
