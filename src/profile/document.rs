use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Guardian-consent record proving adult supervision was confirmed.
/// Immutable once written: no update path revises it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnboardingRecord {
    pub parent_name: String,
    pub parent_contact: String,
    pub parent_nearby: bool,
    pub government_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Per-identity mall document. Created at signup, mutated by location pins,
/// activity bumps, follow actions, filed reports and the onboarding
/// completion step; never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub email: String,
    pub username: String,
    pub avatar_id: Option<String>,
    pub location: Option<GeoPoint>,
    /// Coarse area bucket derived from the location; `None` until pinned.
    pub area_id: Option<String>,
    pub activity_score: u64,
    pub followers: BTreeSet<String>,
    pub following: BTreeSet<String>,
    pub is_active: bool,
    pub verified: bool,
    pub onboarding_complete: bool,
    pub report_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub onboarding: Option<OnboardingRecord>,
}

impl Profile {
    /// Fresh document as written at signup. Onboarding always starts
    /// incomplete; the consent flow is the only path that flips it.
    pub fn at_signup(
        email: impl Into<String>,
        username: impl Into<String>,
        avatar_id: Option<String>,
        location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            avatar_id,
            area_id: Some(location.area_id()),
            location: Some(location),
            activity_score: 0,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            is_active: true,
            verified: false,
            onboarding_complete: false,
            report_count: 0,
            created_at: now,
            last_active: now,
            location_updated_at: None,
            onboarding: None,
        }
    }
}

/// Merge-style partial update, mirroring the document-store semantics:
/// only the populated fields are written, everything else is left alone.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub avatar_id: Option<String>,
    pub location: Option<GeoPoint>,
    pub area_id: Option<String>,
    /// Counter increment, not an absolute value.
    pub activity_delta: Option<u64>,
    /// Counter increment, not an absolute value.
    pub report_delta: Option<u64>,
    pub follower_added: Option<String>,
    pub following_added: Option<String>,
    pub onboarding: Option<OnboardingRecord>,
    pub onboarding_complete: Option<bool>,
    pub last_active: Option<DateTime<Utc>>,
    pub location_updated_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    /// Location pin: new position, re-derived area bucket, touch timestamp.
    pub fn pin_location(point: GeoPoint, now: DateTime<Utc>) -> Self {
        Self {
            area_id: Some(point.area_id()),
            location: Some(point),
            location_updated_at: Some(now),
            ..Self::default()
        }
    }

    /// Activity counter bump plus a last-active touch.
    pub fn bump_activity(points: u64, now: DateTime<Utc>) -> Self {
        Self {
            activity_delta: Some(points),
            last_active: Some(now),
            ..Self::default()
        }
    }

    /// Record a follow edge on the followed side.
    pub fn follower_added(uid: impl Into<String>) -> Self {
        Self { follower_added: Some(uid.into()), ..Self::default() }
    }

    /// The follower's half of the edge, worth one activity point.
    pub fn followed(target_uid: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            following_added: Some(target_uid.into()),
            activity_delta: Some(1),
            last_active: Some(now),
            ..Self::default()
        }
    }

    /// One report filed against the profile's owner.
    pub fn reported() -> Self {
        Self { report_delta: Some(1), ..Self::default() }
    }

    /// The one update that completes onboarding: record and flag together.
    pub fn complete_onboarding(record: OnboardingRecord) -> Self {
        Self {
            last_active: Some(record.completed_at),
            onboarding_complete: Some(true),
            onboarding: Some(record),
            ..Self::default()
        }
    }

    /// Merge into an existing document.
    pub fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.username {
            profile.username = v;
        }
        if let Some(v) = self.avatar_id {
            profile.avatar_id = Some(v);
        }
        if let Some(v) = self.location {
            profile.location = Some(v);
        }
        if let Some(v) = self.area_id {
            profile.area_id = Some(v);
        }
        if let Some(delta) = self.activity_delta {
            profile.activity_score += delta;
        }
        if let Some(delta) = self.report_delta {
            profile.report_count += delta;
        }
        if let Some(v) = self.follower_added {
            profile.followers.insert(v);
        }
        if let Some(v) = self.following_added {
            profile.following.insert(v);
        }
        if let Some(v) = self.onboarding {
            profile.onboarding = Some(v);
        }
        if let Some(v) = self.onboarding_complete {
            profile.onboarding_complete = v;
        }
        if let Some(v) = self.last_active {
            profile.last_active = v;
        }
        if let Some(v) = self.location_updated_at {
            profile.location_updated_at = Some(v);
        }
    }
}
