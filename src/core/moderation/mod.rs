// Core moderation module - blocklist sanitizing and the strike/ban gate.
// Following the same pattern as the community module.

pub mod moderation_models;
pub mod moderation_service;
pub mod profanity_matcher;

pub use moderation_models::*;
pub use moderation_service::*;
pub use profanity_matcher::{sanitize, Blocklist, ProfanityMatcher, MASK_CHAR};
