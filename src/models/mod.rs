//! Domain model module declarations.

pub mod channel;
pub mod message;
pub mod user;
