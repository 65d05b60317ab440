// Core community module - the send flow in front of the shared chat.

pub mod community_models;
pub mod community_service;

pub use community_models::*;
pub use community_service::*;
