//! MallContext: composition root wiring the capability implementations to
//! the session, the interaction gate and the onboarding flow, plus the
//! profile actions the UI triggers once signed in.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::AuthFlow;
use crate::error::{MallError, MallResult};
use crate::gate::InteractionGate;
use crate::geo::{GeoPoint, Geolocator};
use crate::identity::{IdentityStore, LocalIdentityStore, SessionHandle};
use crate::moderation::{ContentValidator, PatternValidator};
use crate::onboarding::OnboardingFlow;
use crate::profile::{MemoryProfileStore, ProfilePatch, ProfileStore};

pub struct MallContext {
    pub session: SessionHandle,
    pub auth: AuthFlow,
    pub gate: InteractionGate,
    pub onboarding: OnboardingFlow,
    profiles: Arc<dyn ProfileStore>,
}

impl MallContext {
    /// Wire a context over explicit capability implementations. One context
    /// exists per app lifetime; dropping it tears down the gate and the
    /// onboarding watcher (full-reload semantics).
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        validator: Arc<dyn ContentValidator>,
    ) -> Self {
        let session = SessionHandle::new();
        let auth = AuthFlow::new(
            identity,
            Arc::clone(&profiles),
            validator,
            session.clone(),
        );
        let gate = InteractionGate::new(session.clone());
        let onboarding = OnboardingFlow::new(Arc::clone(&profiles), session.clone());
        Self { session, auth, gate, onboarding, profiles }
    }

    /// All-local wiring (in-memory stores, default moderation list) for the
    /// demo CLI and tests.
    pub fn local() -> Self {
        Self::new(
            Arc::new(LocalIdentityStore::new()),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(PatternValidator::default()),
        )
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Pin the signed-in user's location: one-shot geolocation, then a merge
    /// update carrying the position, the re-derived area bucket and the
    /// location timestamp.
    pub async fn pin_location(&self, geolocator: &dyn Geolocator) -> MallResult<GeoPoint> {
        let Some(identity) = self.session.current() else {
            return Err(MallError::auth(
                "not_signed_in",
                "You must be logged in to save location.",
            ));
        };
        let point = geolocator.current_location().await?;
        self.profiles
            .update(&identity.uid, ProfilePatch::pin_location(point, Utc::now()))
            .await?;
        info!(target: "mall", "profile.pin uid={} area={}", identity.uid, point.area_id());
        Ok(point)
    }

    /// Bump the signed-in user's activity score.
    pub async fn bump_activity(&self, points: u64) -> MallResult<()> {
        let Some(identity) = self.session.current() else {
            return Err(MallError::auth("not_signed_in", "Sign in to earn activity."));
        };
        self.profiles
            .update(&identity.uid, ProfilePatch::bump_activity(points, Utc::now()))
            .await
    }

    /// Follow another user: the edge is written on both documents and the
    /// follower earns one activity point. Following yourself is rejected.
    pub async fn follow(&self, target_uid: &str) -> MallResult<()> {
        let Some(identity) = self.session.current() else {
            return Err(MallError::auth("not_signed_in", "Sign in to follow people."));
        };
        if identity.uid == target_uid {
            return Err(MallError::validation(
                "self_follow",
                "You cannot follow yourself.",
            ));
        }
        self.profiles
            .update(target_uid, ProfilePatch::follower_added(&identity.uid))
            .await?;
        self.profiles
            .update(&identity.uid, ProfilePatch::followed(target_uid, Utc::now()))
            .await?;
        info!(target: "mall", "profile.follow uid={} target={}", identity.uid, target_uid);
        Ok(())
    }

    /// File a report against another user's profile. The count only ever
    /// goes up; nothing in the core acts on it.
    pub async fn report(&self, target_uid: &str) -> MallResult<()> {
        let Some(identity) = self.session.current() else {
            return Err(MallError::auth("not_signed_in", "Sign in to report content."));
        };
        self.profiles
            .update(target_uid, ProfilePatch::reported())
            .await?;
        info!(target: "mall", "profile.report uid={} target={}", identity.uid, target_uid);
        Ok(())
    }
}
