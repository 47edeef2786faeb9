//! The per-user mall document, distinct from the identity record, plus the
//! profile-store capability seam.

mod document;
mod store;

pub use document::{OnboardingRecord, Profile, ProfilePatch};
pub use store::{MemoryProfileStore, ProfileStore};
