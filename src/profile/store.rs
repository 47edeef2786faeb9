use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{MallError, MallResult};

use super::document::{Profile, ProfilePatch};

/// External document-store capability for profiles. Document-level writes
/// are assumed atomic (no partial-field visibility).
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn read(&self, uid: &str) -> MallResult<Option<Profile>>;
    /// Full document write, used once at signup.
    async fn write(&self, uid: &str, profile: Profile) -> MallResult<()>;
    /// Merge update; only populated patch fields are written.
    async fn update(&self, uid: &str, patch: ProfilePatch) -> MallResult<()>;
}

/// In-memory profile store used by the demo CLI and tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    docs: RwLock<HashMap<String, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn read(&self, uid: &str) -> MallResult<Option<Profile>> {
        Ok(self.docs.read().get(uid).cloned())
    }

    async fn write(&self, uid: &str, profile: Profile) -> MallResult<()> {
        self.docs.write().insert(uid.to_string(), profile);
        Ok(())
    }

    async fn update(&self, uid: &str, patch: ProfilePatch) -> MallResult<()> {
        let mut docs = self.docs.write();
        let Some(profile) = docs.get_mut(uid) else {
            return Err(MallError::store("profile_missing", "No profile document for user."));
        };
        // The consent record is append-once: a second guardian's consent must
        // not overwrite the first.
        if patch.onboarding.is_some() && profile.onboarding.is_some() {
            return Err(MallError::store(
                "onboarding_already_recorded",
                "Onboarding consent has already been recorded.",
            ));
        }
        patch.apply(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::profile::OnboardingRecord;
    use chrono::Utc;

    fn seed(store: &MemoryProfileStore, uid: &str) {
        let p = Profile::at_signup(
            "kid@cloudmail.com",
            "StarRunner",
            None,
            GeoPoint::new(12.9, 77.6),
            Utc::now(),
        );
        store.docs.write().insert(uid.to_string(), p);
    }

    #[tokio::test]
    async fn update_requires_an_existing_document() {
        let store = MemoryProfileStore::new();
        let err = store
            .update("nobody", ProfilePatch::bump_activity(1, Utc::now()))
            .await
            .unwrap_err();
        assert!(err.is_store());
    }

    #[tokio::test]
    async fn onboarding_record_is_append_once() {
        let store = MemoryProfileStore::new();
        seed(&store, "u1");
        let record = OnboardingRecord {
            parent_name: "Asha".into(),
            parent_contact: "asha@home.example".into(),
            parent_nearby: true,
            government_id: "GOV-1".into(),
            completed_at: Utc::now(),
        };
        store
            .update("u1", ProfilePatch::complete_onboarding(record.clone()))
            .await
            .unwrap();

        let second = OnboardingRecord { parent_name: "Someone Else".into(), ..record.clone() };
        let err = store
            .update("u1", ProfilePatch::complete_onboarding(second))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "onboarding_already_recorded");

        // first record untouched
        let p = store.read("u1").await.unwrap().unwrap();
        assert_eq!(p.onboarding.unwrap().parent_name, "Asha");
        assert!(p.onboarding_complete);
    }
}
