//! Single-flight role resolution per activation.
//!
//! Flow Overview:
//! 1) `activate` publishes `Loading` and spawns exactly one identity lookup.
//! 2) The lookup result becomes `Resolved` on success and `Anonymous` on any failure.
//! 3) `deactivate` (or drop) cancels; a result arriving afterwards is discarded.
//!
//! The cancellation check and the state write happen under the same watch lock,
//! and deactivation takes that lock to cancel, so a write can never land after
//! `deactivate` returns.

use super::{IdentityClient, RoleSnapshot, RoleState};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Owns the state of one activation. Each consumer holds its own resolver.
#[derive(Debug)]
pub struct RoleResolver {
    state: Arc<watch::Sender<RoleState>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RoleResolver {
    /// Start resolving. Must be called from within a tokio runtime.
    #[must_use]
    pub fn activate(client: Arc<dyn IdentityClient>) -> Self {
        let (sender, _) = watch::channel(RoleState::Loading);
        let state = Arc::new(sender);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(resolve(client, Arc::clone(&state), cancel.clone()));

        Self {
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Receiver that observes every transition of this activation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> RoleSnapshot {
        self.state.borrow().snapshot()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Wait for the terminal state of this activation.
    pub async fn resolved(&self) -> RoleSnapshot {
        let mut receiver = self.state.subscribe();
        let snapshot = match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.snapshot(),
            // The sender lives as long as `self`, so this only happens on teardown.
            Err(_) => self.current(),
        };
        snapshot
    }

    /// Stop publishing. Returns the lookup task so callers can wait for it.
    pub fn deactivate(mut self) -> Option<JoinHandle<()>> {
        self.cancel_publication();
        self.task.take()
    }

    fn cancel_publication(&self) {
        // Cancel under the watch lock so an in-progress publish either finished
        // before us or observes the cancellation.
        self.state.send_if_modified(|_| {
            self.cancel.cancel();
            false
        });
    }
}

impl Drop for RoleResolver {
    fn drop(&mut self) {
        self.cancel_publication();
    }
}

async fn resolve(
    client: Arc<dyn IdentityClient>,
    state: Arc<watch::Sender<RoleState>>,
    cancel: CancellationToken,
) {
    let outcome = tokio::select! {
        () = cancel.cancelled() => {
            debug!("role resolver deactivated before identity lookup completed");
            return;
        }
        outcome = client.fetch_identity() => outcome,
    };

    let next = match outcome {
        Ok(identity) => {
            debug!(
                is_platform_admin = identity.is_platform_admin,
                has_tenant_role = identity.tenant_role.is_some(),
                "identity resolved"
            );
            RoleState::Resolved(identity)
        }
        Err(err) => {
            warn!("identity lookup failed, treating caller as anonymous: {err}");
            RoleState::Anonymous
        }
    };

    let published = state.send_if_modified(|current| {
        if cancel.is_cancelled() || !current.is_loading() {
            return false;
        }
        *current = next;
        true
    });

    if !published {
        debug!("discarded identity lookup result after deactivation");
    }
}
