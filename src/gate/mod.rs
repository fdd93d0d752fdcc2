//! The access gate.
//!
//! Pure, total functions from a file's state to the actions an operator may
//! take on it. There is no override path here; exceptions belong to an
//! explicitly audited operation in the surrounding authorization layer.

mod access;

pub use access::{can_download, can_view, AccessDecision};
