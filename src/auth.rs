//! Form behavior of the auth surface: collect credentials (sign-in) or the
//! full signup payload, validate before touching the identity store, drive
//! the store call, and transition the session on success.
//!
//! The gate never hears about failures here: a failed submission surfaces
//! inline to the user and leaves any queued interaction requests suspended,
//! awaiting a successful retry or an explicit dismissal.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{MallError, MallResult};
use crate::geo::GeoPoint;
use crate::identity::{Identity, IdentityStore, SessionHandle};
use crate::moderation::ContentValidator;
use crate::profile::{Profile, ProfileStore};

/// Signup payload. Location must have been obtained through the separate
/// geolocation step before submission.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub username: String,
    pub location: Option<GeoPoint>,
    pub avatar_id: Option<String>,
}

pub struct AuthFlow {
    identity: Arc<dyn IdentityStore>,
    profiles: Arc<dyn ProfileStore>,
    validator: Arc<dyn ContentValidator>,
    session: SessionHandle,
}

impl AuthFlow {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        validator: Arc<dyn ContentValidator>,
        session: SessionHandle,
    ) -> Self {
        Self { identity, profiles, validator, session }
    }

    /// Sign in with existing credentials. On success the session
    /// transitions, which is what resolves any gated callers.
    pub async fn sign_in(&self, email: &str, password: &str) -> MallResult<Identity> {
        let identity = self.identity.sign_in(email, password).await?;
        info!(target: "mall", "auth.signin uid={}", identity.uid);
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    /// Create an account plus its profile document.
    ///
    /// Validation runs before any identity-store call: username presence,
    /// content moderation, location presence. The profile is written with
    /// `onboarding_complete = false`; the consent flow is the only path
    /// that completes it. The session transitions only after the profile
    /// write succeeds.
    pub async fn sign_up(&self, form: SignupForm) -> MallResult<Identity> {
        if form.username.trim().is_empty() {
            return Err(MallError::validation(
                "username_required",
                "Username is required for sign up.",
            ));
        }
        self.validator.validate(&form.username)?;
        let Some(location) = form.location else {
            return Err(MallError::validation(
                "location_required",
                "Location is required for sign up. Please pin your location.",
            ));
        };

        let identity = self.identity.create_account(&form.email, &form.password).await?;
        let profile = Profile::at_signup(
            identity.email.clone(),
            form.username,
            form.avatar_id,
            location,
            Utc::now(),
        );
        if let Err(e) = self.profiles.write(&identity.uid, profile).await {
            warn!(target: "mall", "auth.signup profile write failed uid={}: {}", identity.uid, e);
            return Err(e);
        }
        info!(target: "mall", "auth.signup uid={} area={}", identity.uid, location.area_id());
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    /// Sign out and drop the local identity reference.
    pub async fn sign_out(&self) -> MallResult<()> {
        self.identity.sign_out().await?;
        info!(target: "mall", "auth.signout");
        self.session.signed_out();
        Ok(())
    }
}
