//! livemark: live markdown presentations with capability-based access
//!
//! A presenter creates a topic and receives its secret; anyone holding the
//! topic id can watch, anyone holding the secret can publish. Content and
//! navigation fan out to every open WebSocket for the topic.

pub mod arguments;
pub mod capability;
pub mod config;
pub mod errors;
pub mod logger;
pub mod run;
pub mod storage;
pub mod topics;
pub mod webserver;
