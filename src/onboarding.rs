//! Profile-completion flow: forces guardian-consent capture before granting
//! unrestricted use. Independent of the interaction gate; it watches the
//! same session stream and owns its own surface visibility.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{MallError, MallResult};
use crate::identity::{SessionHandle, SessionState};
use crate::profile::{OnboardingRecord, ProfilePatch, ProfileStore};

/// Completion state for the current session's profile. `Unchecked` until a
/// sign-in triggers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStatus {
    Unchecked,
    Incomplete,
    Complete,
}

/// Guardian-consent submission. All four fields are mandatory and checked
/// in a fixed order: presence confirmation, name, contact, id.
#[derive(Debug, Clone, Default)]
pub struct ConsentForm {
    pub parent_name: String,
    pub parent_contact: String,
    pub parent_nearby: bool,
    pub government_id: String,
}

impl ConsentForm {
    fn validate(&self) -> MallResult<()> {
        if !self.parent_nearby {
            return Err(MallError::validation(
                "supervision_unconfirmed",
                "Parent supervision must be confirmed.",
            ));
        }
        if self.parent_name.trim().is_empty() {
            return Err(MallError::validation("parent_name_required", "Parent name is required."));
        }
        if self.parent_contact.trim().is_empty() {
            return Err(MallError::validation(
                "parent_contact_required",
                "Parent contact is required.",
            ));
        }
        if self.government_id.trim().is_empty() {
            return Err(MallError::validation(
                "government_id_required",
                "Guardian government ID is required.",
            ));
        }
        Ok(())
    }
}

pub struct OnboardingFlow {
    profiles: Arc<dyn ProfileStore>,
    session: SessionHandle,
    status_tx: Arc<watch::Sender<OnboardingStatus>>,
    form_tx: Arc<watch::Sender<bool>>,
    // Guards against the consent surface reappearing mid-session after an
    // explicit cancel; cleared by the next sign-in.
    cancelled: Arc<Mutex<bool>>,
    watcher: JoinHandle<()>,
}

impl OnboardingFlow {
    pub fn new(profiles: Arc<dyn ProfileStore>, session: SessionHandle) -> Self {
        let (status_tx, _) = watch::channel(OnboardingStatus::Unchecked);
        let status_tx = Arc::new(status_tx);
        let (form_tx, _) = watch::channel(false);
        let form_tx = Arc::new(form_tx);
        let cancelled = Arc::new(Mutex::new(false));

        let mut session_rx = session.subscribe();
        let watcher = {
            let profiles = Arc::clone(&profiles);
            let status_tx = Arc::clone(&status_tx);
            let form_tx = Arc::clone(&form_tx);
            let cancelled = Arc::clone(&cancelled);
            tokio::spawn(async move {
                // Coalescing watch semantics: only the latest session state
                // is observed, so a sign-in that is immediately reversed
                // before this task polls never opens the form. Fine either
                // way, since the next qualifying sign-in re-checks.
                while session_rx.changed().await.is_ok() {
                    let state = session_rx.borrow_and_update().clone();
                    match state {
                        SessionState::SignedIn(identity) => {
                            // Every qualifying sign-in re-checks, so a form
                            // cancelled last session reappears here.
                            *cancelled.lock() = false;
                            match fetch_status(profiles.as_ref(), &identity.uid).await {
                                Ok(status) => apply_status(&status_tx, &form_tx, status),
                                Err(e) => {
                                    warn!(target: "mall", "onboarding.fetch failed uid={}: {}", identity.uid, e);
                                }
                            }
                        }
                        SessionState::SignedOut => {
                            apply_status(&status_tx, &form_tx, OnboardingStatus::Unchecked);
                        }
                    }
                }
            })
        };

        Self { profiles, session, status_tx, form_tx, cancelled, watcher }
    }

    pub fn status(&self) -> OnboardingStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OnboardingStatus> {
        self.status_tx.subscribe()
    }

    /// Whether the consent form should currently be shown.
    pub fn form_visible(&self) -> bool {
        *self.form_tx.borrow()
    }

    pub fn form_updates(&self) -> watch::Receiver<bool> {
        self.form_tx.subscribe()
    }

    /// Re-fetch the current profile and recompute the status. The watcher
    /// does this on every sign-in; explicit calls are for the UI layer's
    /// retry action.
    pub async fn refresh(&self) -> MallResult<OnboardingStatus> {
        let Some(identity) = self.session.current() else {
            apply_status(&self.status_tx, &self.form_tx, OnboardingStatus::Unchecked);
            return Ok(OnboardingStatus::Unchecked);
        };
        let status = fetch_status(self.profiles.as_ref(), &identity.uid).await?;
        if *self.cancelled.lock() && status == OnboardingStatus::Incomplete {
            // keep the surface hidden for the rest of this session
            self.status_tx.send_replace(status);
        } else {
            apply_status(&self.status_tx, &self.form_tx, status);
        }
        Ok(status)
    }

    /// Submit the guardian-consent form. On success the record and the
    /// completion flag are written in one merge update, the flow becomes
    /// `Complete` and the surface is dismissed.
    pub async fn submit_consent(&self, form: ConsentForm) -> MallResult<()> {
        let Some(identity) = self.session.current() else {
            return Err(MallError::auth("not_signed_in", "Sign in before completing onboarding."));
        };
        form.validate()?;

        let existing = self.profiles.read(&identity.uid).await?;
        let Some(profile) = existing else {
            return Err(MallError::store("profile_missing", "No profile document for user."));
        };
        if profile.onboarding.is_some() {
            // Append-once: a second guardian's consent never overwrites the
            // first.
            return Err(MallError::store(
                "onboarding_already_recorded",
                "Onboarding consent has already been recorded.",
            ));
        }

        let record = OnboardingRecord {
            parent_name: form.parent_name.trim().to_string(),
            parent_contact: form.parent_contact.trim().to_string(),
            parent_nearby: form.parent_nearby,
            government_id: form.government_id.trim().to_string(),
            completed_at: Utc::now(),
        };
        self.profiles
            .update(&identity.uid, ProfilePatch::complete_onboarding(record))
            .await?;
        info!(target: "mall", "onboarding.complete uid={}", identity.uid);
        apply_status(&self.status_tx, &self.form_tx, OnboardingStatus::Complete);
        Ok(())
    }

    /// Dismiss the consent form without touching the profile. The status
    /// stays `Incomplete`; the form reappears on the next qualifying
    /// sign-in.
    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.form_tx.send_replace(false);
    }
}

impl Drop for OnboardingFlow {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

async fn fetch_status(profiles: &dyn ProfileStore, uid: &str) -> MallResult<OnboardingStatus> {
    let status = match profiles.read(uid).await? {
        Some(profile) if profile.onboarding_complete => OnboardingStatus::Complete,
        // absent profile counts as incomplete: consent is still owed
        _ => OnboardingStatus::Incomplete,
    };
    Ok(status)
}

fn apply_status(
    status_tx: &watch::Sender<OnboardingStatus>,
    form_tx: &watch::Sender<bool>,
    status: OnboardingStatus,
) {
    status_tx.send_replace(status);
    form_tx.send_replace(status == OnboardingStatus::Incomplete);
}
