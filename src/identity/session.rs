use std::sync::Arc;
use tokio::sync::watch;
use crate::tprintln;

use super::principal::Identity;

/// Who is signed in, as a tagged union rather than drifting booleans.
/// There is deliberately no intermediate "authenticating" state:
/// authentication is a one-shot async call whose failure surfaces as an
/// error value to the submitting caller and leaves this state untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::SignedOut => None,
            SessionState::SignedIn(id) => Some(id),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}

/// Single source of truth for the current session, clone-shareable.
///
/// The handle is the single mutation point: only the auth surface calls
/// `signed_in`/`signed_out` in production code. Everything else observes,
/// either by polling `current()` or by subscribing to the watch stream.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::SignedOut);
        Self { tx: Arc::new(tx) }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Current identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().identity().cloned()
    }

    /// Observation stream; receivers see every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Transition to signed-in. Crate-internal: driven only by identity
    /// store successes (sign-in, sign-up, restored session).
    pub(crate) fn signed_in(&self, identity: Identity) {
        tprintln!("session.signin uid={} email={}", identity.uid, identity.email);
        self.tx.send_replace(SessionState::SignedIn(identity));
    }

    /// Transition to signed-out, dropping the local identity reference.
    pub(crate) fn signed_out(&self) {
        tprintln!("session.signout");
        self.tx.send_replace(SessionState::SignedOut);
    }
}
