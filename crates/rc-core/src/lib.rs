//! rp-community/crates/rc-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the community portal:
//! announcements, reactions, threaded comments, shares, profiles and the
//! authorization rules that gate them.

pub mod error;
pub mod feed;
pub mod gate;
pub mod models;
pub mod services;
pub mod session;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use session::{Session, SessionStore};
pub use traits::*;
