// Community moderation for the LUME support app.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage-agnostic): the moderation gate and the send flow
// - `infra/` = Implementations of core traits (JSON file, SQLite, in-memory)
// - `config` = Environment-driven settings for the binary

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;
