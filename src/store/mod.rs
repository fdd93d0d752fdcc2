//! Append-only verdict storage.
//!
//! The [`VerdictStore`] trait is the seam for persistence; the library ships
//! an [`InMemoryVerdictStore`]. Every insertion is published on a change
//! feed that drives threat notifications and cache invalidation.

mod memory;
mod traits;

pub use memory::{InMemoryVerdictStore, StoreConfig};
pub use traits::{latest, ArcVerdictStore, VerdictEvent, VerdictFeed, VerdictStore};
