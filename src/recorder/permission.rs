//! Microphone permission handshake.
//!
//! Asking the platform for microphone access is asynchronous: the prompt is
//! shown somewhere else and its answer arrives later through a callback. The
//! broker keeps a table of pending requests keyed by a generated token, hands
//! the platform a [`PermissionResponder`] bound to that token, and resolves the
//! waiting caller exactly once when the answer comes back.
//!
//! Only one request may be pending at a time. A second request while one is
//! outstanding fails with [`PermissionError::Superseded`]; the pending request
//! keeps its place and is still resolved normally.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("A permission request is already pending")]
    Superseded,
    #[error("Permission request was abandoned before an answer arrived")]
    Abandoned,
}

/// Identifies one pending permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform side of the handshake.
pub trait PermissionPlatform: Send + Sync {
    /// Whether microphone access is currently granted.
    fn check(&self) -> bool;

    /// Shows the platform prompt. The answer must be delivered through
    /// `responder`, from any thread and at any later time.
    ///
    /// Returns `false` when no prompt can be shown; the request then resolves
    /// as not granted.
    fn prompt(&self, responder: PermissionResponder) -> bool;
}

/// One-shot handle the platform uses to answer a specific request.
///
/// Dropping it without answering abandons the request.
pub struct PermissionResponder {
    broker: PermissionBroker,
    token: RequestToken,
}

impl PermissionResponder {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Delivers the answer. Returns whether a caller was still waiting.
    pub fn resolve(self, granted: bool) -> bool {
        self.broker.complete(self.token, granted)
    }
}

impl Drop for PermissionResponder {
    fn drop(&mut self) {
        // No-op once resolved; otherwise drops the sender and wakes the waiter.
        self.broker.state().pending.remove(&self.token);
    }
}

/// Removes a request from the pending table when its waiter goes away,
/// including when the waiting future is cancelled.
struct PendingGuard<'a> {
    broker: &'a PermissionBroker,
    token: RequestToken,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.broker.state().pending.remove(&self.token).is_some() {
            tracing::debug!("Permission request {} withdrawn", self.token);
        }
    }
}

#[derive(Default)]
struct BrokerState {
    next_token: u64,
    pending: HashMap<RequestToken, oneshot::Sender<bool>>,
}

struct Shared {
    platform: Arc<dyn PermissionPlatform>,
    state: Mutex<BrokerState>,
}

/// Correlates permission requests with platform answers.
#[derive(Clone)]
pub struct PermissionBroker {
    shared: Arc<Shared>,
}

impl PermissionBroker {
    pub fn new(platform: Arc<dyn PermissionPlatform>) -> Self {
        Self {
            shared: Arc::new(Shared {
                platform,
                state: Mutex::new(BrokerState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_permission(&self) -> bool {
        self.shared.platform.check()
    }

    pub fn is_pending(&self) -> bool {
        !self.state().pending.is_empty()
    }

    /// Requests microphone access, prompting if it is not already granted.
    ///
    /// # Errors
    /// - `Superseded` if another request is still waiting for its answer
    /// - `Abandoned` if the platform dropped the request without answering
    pub async fn request(&self) -> Result<bool, PermissionError> {
        if self.shared.platform.check() {
            return Ok(true);
        }

        let (token, receiver) = {
            let mut state = self.state();
            if !state.pending.is_empty() {
                tracing::warn!("Permission request rejected: another request is pending");
                return Err(PermissionError::Superseded);
            }
            state.next_token += 1;
            let token = RequestToken(state.next_token);
            let (sender, receiver) = oneshot::channel();
            state.pending.insert(token, sender);
            (token, receiver)
        };

        let _pending = PendingGuard {
            broker: self,
            token,
        };

        tracing::debug!("Permission request {} pending", token);
        let responder = PermissionResponder {
            broker: self.clone(),
            token,
        };
        if !self.shared.platform.prompt(responder) {
            tracing::info!("Permission prompt unavailable, reporting not granted");
            return Ok(false);
        }

        let granted = receiver.await.map_err(|_| PermissionError::Abandoned)?;
        tracing::info!("Permission request {} resolved: granted={}", token, granted);
        Ok(granted)
    }

    /// Resolves a pending request. Unknown or already resolved tokens are ignored.
    pub fn complete(&self, token: RequestToken, granted: bool) -> bool {
        let sender = self.state().pending.remove(&token);
        match sender {
            Some(sender) => sender.send(granted).is_ok(),
            None => {
                tracing::debug!("Ignoring answer for stale permission request {}", token);
                false
            }
        }
    }
}

/// Terminal prompt that remembers a grant in the data directory.
///
/// Desktop audio hosts do not gate microphone access themselves, so the
/// consent question is asked on the terminal once and stored.
pub struct ConsolePermissions {
    grant_file: PathBuf,
}

impl ConsolePermissions {
    pub fn new(data_dir: &std::path::Path) -> Self {
        Self {
            grant_file: data_dir.join("microphone.granted"),
        }
    }
}

impl PermissionPlatform for ConsolePermissions {
    fn check(&self) -> bool {
        self.grant_file.exists()
    }

    fn prompt(&self, responder: PermissionResponder) -> bool {
        let grant_file = self.grant_file.clone();
        std::thread::spawn(move || {
            print!("Allow obs2vid to record from your microphone? [y/N] ");
            let _ = io::stdout().flush();

            let mut answer = String::new();
            let granted = io::stdin().lock().read_line(&mut answer).is_ok()
                && matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");

            if granted {
                if let Err(e) = std::fs::write(&grant_file, b"granted\n") {
                    tracing::warn!("Failed to remember microphone grant: {}", e);
                }
            }
            responder.resolve(granted);
        });
        true
    }
}
