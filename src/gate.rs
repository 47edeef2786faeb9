//! The interaction gate: lets any UI action declare "this requires a
//! signed-in user", suspends the caller while the auth surface collects an
//! identity, and resumes every suspended caller the moment the session
//! transitions.
//!
//! Contract notes:
//! - All queued requests resolve together against a single session
//!   transition; the batch is drained under one lock.
//! - Dismissing the surface resolves every queued request with `None`.
//!   Absence of identity is a valid outcome, not an error; callers branch
//!   on it.
//! - Requests resolved with `None` are never retroactively re-resolved by a
//!   later sign-in; only requests queued at transition time benefit.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::identity::{Identity, SessionHandle, SessionState};

/// Queue of suspended callers plus the surface-visibility flag. These are
/// the gate's only mutable state and are always updated together under the
/// same lock.
struct GateShared {
    pending: Vec<oneshot::Sender<Option<Identity>>>,
    surface_open: bool,
}

pub struct InteractionGate {
    session: SessionHandle,
    shared: Arc<Mutex<GateShared>>,
    surface_tx: Arc<watch::Sender<bool>>,
    watcher: JoinHandle<()>,
}

impl InteractionGate {
    /// Builds the gate and starts its session watcher. One instance exists
    /// per app lifetime; dropping it (full reload) tears the watcher down
    /// and releases any still-suspended caller with `None`.
    pub fn new(session: SessionHandle) -> Self {
        let shared = Arc::new(Mutex::new(GateShared { pending: Vec::new(), surface_open: false }));
        let (surface_tx, _) = watch::channel(false);
        let surface_tx = Arc::new(surface_tx);

        let mut session_rx = session.subscribe();
        let watcher = {
            let shared = Arc::clone(&shared);
            let surface_tx = Arc::clone(&surface_tx);
            tokio::spawn(async move {
                // The watch channel coalesces: a sign-in followed by a
                // sign-out before this task polls is observed only as the
                // final signed-out state, and queued requests stay queued
                // past the transient identity. The UI drives auth from a
                // single task, so the pair cannot actually land between
                // polls; if it did, staying queued is the right outcome.
                while session_rx.changed().await.is_ok() {
                    let state = session_rx.borrow_and_update().clone();
                    if let SessionState::SignedIn(identity) = state {
                        resolve_all(&shared, &surface_tx, Some(identity));
                    }
                    // A transition to signed-out leaves queued requests
                    // queued: they resolve only on sign-in or dismissal.
                }
            })
        };

        Self { session, shared, surface_tx, watcher }
    }

    /// Ensure an identity exists before proceeding.
    ///
    /// Resolves immediately when the session is already signed in (no
    /// suspension, no surface). Otherwise the caller is suspended on the
    /// queue and the auth surface is made visible; opening an already-open
    /// surface is a no-op. The returned `None` means the user dismissed the
    /// surface without signing in.
    pub async fn require_identity(&self) -> Option<Identity> {
        let rx = {
            let mut shared = self.shared.lock();
            // Checked under the lock so a concurrent sign-in either resolves
            // us immediately here or finds us already queued.
            if let Some(identity) = self.session.current() {
                return Some(identity);
            }
            let (tx, rx) = oneshot::channel();
            shared.pending.push(tx);
            if !shared.surface_open {
                shared.surface_open = true;
                self.surface_tx.send_replace(true);
                debug!(target: "mall", "gate.surface_open pending={}", shared.pending.len());
            }
            rx
        };
        rx.await.unwrap_or(None)
    }

    /// Explicit dismissal of the auth surface. Every queued request resolves
    /// with `None`; the session is untouched.
    pub fn dismiss(&self) {
        resolve_all(&self.shared, &self.surface_tx, None);
    }

    /// Whether the auth surface should currently be shown.
    pub fn surface_visible(&self) -> bool {
        self.shared.lock().surface_open
    }

    /// Visibility stream for the UI layer rendering the surface.
    pub fn surface_updates(&self) -> watch::Receiver<bool> {
        self.surface_tx.subscribe()
    }

    /// Number of callers currently suspended.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }
}

impl Drop for InteractionGate {
    fn drop(&mut self) {
        self.watcher.abort();
        resolve_all(&self.shared, &self.surface_tx, None);
    }
}

/// Drain the whole queue against one outcome and close the surface. The
/// batch is taken under a single lock acquisition, so every suspended caller
/// observes the same transition.
fn resolve_all(
    shared: &Mutex<GateShared>,
    surface_tx: &watch::Sender<bool>,
    outcome: Option<Identity>,
) {
    let (batch, was_open) = {
        let mut shared = shared.lock();
        let was_open = shared.surface_open;
        shared.surface_open = false;
        (std::mem::take(&mut shared.pending), was_open)
    };
    if was_open {
        surface_tx.send_replace(false);
    }
    if batch.is_empty() {
        // Purely reactive: a background sign-in with no pending demand does
        // nothing.
        return;
    }
    debug!(
        target: "mall",
        "gate.resolve batch={} outcome={}",
        batch.len(),
        if outcome.is_some() { "identity" } else { "none" }
    );
    for tx in batch {
        // A caller that stopped awaiting is fine to ignore.
        let _ = tx.send(outcome.clone());
    }
}
