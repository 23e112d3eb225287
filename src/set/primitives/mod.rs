//! Shared building blocks for the leveled sets.
//!
//! ## Storage
//! - `Arena`: index-addressed node table with a free list and a head sentinel
//!
//! ## Bookkeeping
//! - `RecencyLog`: intrusive doubly linked list ordering nodes by last search

pub mod arena;
pub mod recency;

pub use arena::Arena;
pub use arena::HEAD;
pub use arena::Idx;
pub use arena::NULL;
pub use recency::RecencyLog;
