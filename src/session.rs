//! Observable session state
//!
//! [`SessionStore`] holds the single [`Session`] of the process and notifies
//! subscribers on every change.  It performs no flow logic: every mutation
//! comes from [`AuthFlowController`](crate::auth::flow::AuthFlowController)
//! through the crate-private methods below.
//!
//! The user and the access token are stored together as one identity, so a
//! session can never hold one without the other.  The token is never handed
//! out; dependents call [`SessionStore::decorate`] to attach it to an
//! outgoing request.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::{AuthError, Result};
use crate::http::{inject_bearer, Headers};
use crate::profile::User;

#[derive(Clone)]
struct Identity {
    user: User,
    access_token: String,
    signed_in_at: DateTime<Utc>,
}

/// Snapshot of the session.
#[derive(Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
    is_signing_in: bool,
    is_signing_out: bool,
    /// Bumped by every sign-out; a sign-in only commits into the generation
    /// it started in.
    generation: u64,
}

impl Session {
    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        self.identity.as_ref().map(|i| &i.user)
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// When the current identity was established.
    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.identity.as_ref().map(|i| i.signed_in_at)
    }

    /// Whether a sign-in is in flight.
    pub fn is_signing_in(&self) -> bool {
        self.is_signing_in
    }

    /// Whether a sign-out is in flight.
    pub fn is_signing_out(&self) -> bool {
        self.is_signing_out
    }

    pub(crate) fn access_token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.access_token.as_str())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user())
            .field("is_signing_in", &self.is_signing_in)
            .field("is_signing_out", &self.is_signing_out)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flight {
    SignIn,
    SignOut,
}

/// Holds an in-flight flag for the lifetime of one operation.
///
/// Dropping the guard clears the flag, whether the operation returned,
/// failed, or its future was dropped mid-await.
#[must_use]
pub(crate) struct FlightGuard<'a> {
    store: &'a SessionStore,
    flight: Flight,
    generation: u64,
}

impl FlightGuard<'_> {
    /// Generation the operation started in.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let flight = self.flight;
        self.store.tx.send_modify(|session| match flight {
            Flight::SignIn => session.is_signing_in = false,
            Flight::SignOut => session.is_signing_out = false,
        });
    }
}

/// Owner of the process's [`Session`].
///
/// Shared as `Arc<SessionStore>` between the controller and every dependent.
///
/// # Examples
///
/// ```
/// use twitch_session::session::SessionStore;
///
/// let store = SessionStore::new();
/// let session = store.snapshot();
/// assert!(!session.is_authenticated());
/// assert!(!session.is_signing_in());
/// assert!(!session.is_signing_out());
/// ```
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates an unauthenticated store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx }
    }

    /// Current session.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user().cloned()
    }

    /// Whether a sign-in is in flight.
    pub fn is_signing_in(&self) -> bool {
        self.tx.borrow().is_signing_in
    }

    /// Whether a sign-out is in flight.
    pub fn is_signing_out(&self) -> bool {
        self.tx.borrow().is_signing_out
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Attaches the bearer credential of the current identity to `headers`.
    ///
    /// Removes any `Authorization` header when no one is signed in, so a
    /// stale credential can never leak into a request.
    pub fn decorate(&self, headers: &mut Headers) {
        match self.tx.borrow().access_token() {
            Some(token) => inject_bearer(headers, token),
            None => {
                headers.remove(crate::http::AUTHORIZATION_HEADER);
            }
        }
    }

    /// Marks a sign-in as started.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignInInProgress`] or
    /// [`AuthError::SignOutInProgress`] when another operation holds the
    /// session.
    pub(crate) fn begin_sign_in(&self) -> Result<FlightGuard<'_>> {
        let mut rejection = None;
        let mut generation = 0;
        self.tx.send_if_modified(|session| {
            if session.is_signing_in {
                rejection = Some(AuthError::SignInInProgress);
                false
            } else if session.is_signing_out {
                rejection = Some(AuthError::SignOutInProgress);
                false
            } else {
                session.is_signing_in = true;
                generation = session.generation;
                true
            }
        });

        match rejection {
            Some(err) => Err(err.into()),
            None => Ok(FlightGuard {
                store: self,
                flight: Flight::SignIn,
                generation,
            }),
        }
    }

    /// Marks a sign-out as started and opens a new generation, so any
    /// sign-in already in flight can no longer commit.  Returns `None` when
    /// a sign-out is already running.
    pub(crate) fn begin_sign_out(&self) -> Option<FlightGuard<'_>> {
        let mut generation = None;
        self.tx.send_if_modified(|session| {
            if session.is_signing_out {
                false
            } else {
                session.is_signing_out = true;
                session.generation += 1;
                generation = Some(session.generation);
                true
            }
        });

        generation.map(|generation| FlightGuard {
            store: self,
            flight: Flight::SignOut,
            generation,
        })
    }

    /// Token held by the current identity.
    pub(crate) fn access_token(&self) -> Option<String> {
        self.tx.borrow().access_token().map(str::to_string)
    }

    /// Stores `user` and `access_token` as the session identity, provided no
    /// sign-out has happened since `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignInInterrupted`] when the session moved on;
    /// nothing is stored in that case.
    pub(crate) fn establish(&self, generation: u64, user: User, access_token: String) -> Result<()> {
        let mut identity = Some(Identity {
            user,
            access_token,
            signed_in_at: Utc::now(),
        });
        let committed = self.tx.send_if_modified(|session| {
            if session.generation != generation {
                return false;
            }
            session.identity = identity.take();
            true
        });

        if committed {
            Ok(())
        } else {
            Err(AuthError::SignInInterrupted.into())
        }
    }

    /// Drops the identity.
    pub(crate) fn clear(&self) {
        self.tx.send_modify(|session| {
            session.identity = None;
        });
    }
}
