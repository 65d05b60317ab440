// Implementations of the moderation record store.

pub mod in_memory;
pub mod json_store;

pub use in_memory::InMemoryModerationStore;
pub use json_store::JsonModerationStore;
