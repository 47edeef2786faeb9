use serde::{Deserialize, Serialize};

/// An authenticated user reference as issued by the external identity store.
/// The uid is opaque and store-assigned; no password material is ever held
/// client-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

impl Identity {
    pub fn new<S: Into<String>>(uid: S, email: S) -> Self {
        Self { uid: uid.into(), email: email.into() }
    }
}
