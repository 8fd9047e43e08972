//! Per-user conversation state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Which multi-step dialogue a user is currently inside.
///
/// Exactly one state exists per user. Pending import key material lives only
/// in the `AwaitingWalletName` payload; it is never written to storage before
/// the naming transition completes, so an abandoned import leaves no partial
/// records behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConversationState {
    /// No flow in progress
    #[default]
    Idle,
    /// Next text message is an access-code attempt
    AwaitingAccessCode,
    /// Next text message is a pasted private key
    AwaitingPrivateKey,
    /// Next text message names the decoded wallet
    AwaitingWalletName {
        /// Address derived from the pasted key
        public_key: String,
        /// The pasted key, re-encoded
        private_key: String,
    },
}

/// In-memory map of per-user state cells.
///
/// Each cell is a `Mutex` held for the whole of an `advance` call, which
/// serializes messages from one user while leaving other users untouched.
/// Populated lazily on first contact, cleared by process restart.
#[derive(Default)]
pub struct ConversationStore {
    cells: RwLock<HashMap<i64, Arc<Mutex<ConversationState>>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the state cell for a user
    pub async fn cell(&self, user_id: i64) -> Arc<Mutex<ConversationState>> {
        {
            let cells = self.cells.read().await;
            if let Some(cell) = cells.get(&user_id) {
                return cell.clone();
            }
        }

        let mut cells = self.cells.write().await;
        cells.entry(user_id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cell_starts_idle_and_is_stable() {
        let store = ConversationStore::new();

        let cell = store.cell(1).await;
        assert_eq!(*cell.lock().await, ConversationState::Idle);

        *cell.lock().await = ConversationState::AwaitingPrivateKey;

        // The same cell comes back for the same user
        let again = store.cell(1).await;
        assert_eq!(*again.lock().await, ConversationState::AwaitingPrivateKey);

        // Other users get their own cell
        let other = store.cell(2).await;
        assert_eq!(*other.lock().await, ConversationState::Idle);
    }
}
