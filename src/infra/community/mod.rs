// Implementations of the community message store.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryCommunityStore;
pub use sqlite_store::SqliteCommunityStore;
