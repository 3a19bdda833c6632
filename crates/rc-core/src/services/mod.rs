//! # Services
//!
//! One service per aggregate. Every mutating call takes the acting
//! [`Session`](crate::Session) explicitly and runs the authorization gate
//! before the first backend call.

pub mod accounts;
pub mod announcements;
pub mod comments;
pub mod profiles;
pub mod reactions;
pub mod shares;

pub use accounts::AccountService;
pub use announcements::AnnouncementService;
pub use comments::CommentService;
pub use profiles::ProfileService;
pub use reactions::ReactionService;
pub use shares::ShareService;
