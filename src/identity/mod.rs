//! Central identity and session management for the mall core.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod store;

pub use principal::Identity;
pub use session::{SessionHandle, SessionState};
pub use store::{IdentityStore, LocalIdentityStore};
