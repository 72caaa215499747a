//! Keyguard Types
//!
//! Shared entity, policy, and audit event definitions used by the key
//! lifecycle services and the rotation scheduler.

pub mod error;
pub mod events;
pub mod key;
pub mod policy;
pub mod schemas;

pub use error::*;
pub use events::*;
pub use key::*;
pub use policy::*;
