//! Topics: the unit of collaboration
//!
//! - `models`: in-memory and persisted record shapes
//! - `validation`: id shape, size bound, emoji bound
//! - `directory`: create/read/update over the content store

pub mod directory;
pub mod models;
pub mod validation;

pub use directory::TopicDirectory;
pub use models::{StoredTopic, Topic};
