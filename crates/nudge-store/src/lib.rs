//! # Nudge Store
//! File-backed persistence: the subscriber set and the message pool.
//! JSON files only — readable, diffable, no database.

pub mod messages;
pub mod subscribers;

pub use messages::MessagePool;
pub use subscribers::SubscriberStore;
