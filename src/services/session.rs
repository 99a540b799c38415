use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::error::AppResult;

/// Identity of the signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>) -> Self {
        SessionUser {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Source of bearer tokens for the signed-in user.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn id_token(&self, user: &SessionUser, force_refresh: bool) -> AppResult<Option<String>>;
}

/// Hands out a fixed token; used by the command-line client and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        StaticTokenProvider { token }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn id_token(&self, _user: &SessionUser, _force_refresh: bool) -> AppResult<Option<String>> {
        Ok(self.token.clone())
    }
}

/// Shared, injectable session state.
///
/// Cloning is cheap and every clone observes the same session. Consumers that
/// need to react to sign-in / sign-out hold a [`SessionSubscription`]; dropping
/// it releases the subscription.
#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<SessionUser>>>,
    active: Arc<AtomicUsize>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        SessionContext {
            tx: Arc::new(tx),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        let ctx = Self::new();
        ctx.sign_in(user);
        ctx
    }

    pub fn sign_in(&self, user: SessionUser) {
        debug!("Session started for {}", user.uid);
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            debug!("Session ended for {}", previous.uid);
        }
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> SessionSubscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        SessionSubscription {
            rx: self.tx.subscribe(),
            active: Arc::clone(&self.active),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Live view of session changes. Released on drop.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<Option<SessionUser>>,
    active: Arc<AtomicUsize>,
}

impl SessionSubscription {
    /// Wait for the next sign-in or sign-out. `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<Option<SessionUser>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.rx.borrow().clone()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
