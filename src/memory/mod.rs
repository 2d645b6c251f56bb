//! Episodic memory
//!
//! - `MemoryStore` - Summaries, scratch state and the key-value result cache
//! - `MemorySnapshot` - Bounded read-only view rendered into prompts

mod store;

pub use store::{MemorySnapshot, MemoryStore, DEFAULT_SUMMARY_CAPACITY};
