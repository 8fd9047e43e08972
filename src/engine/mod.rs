//! Conversation engine: sequences multi-message flows per user.
//!
//! Every inbound unit of input passes through [`ConversationEngine::advance`],
//! which consults the per-user state, runs the access-code gate, and hands
//! back an [`Effect`] for the transport layer to render. Transitions are
//! total: input that does not match the current state re-emits a prompt,
//! never panics.

/// Menu actions and screen identifiers
pub mod action;
/// Per-user conversation state
pub mod state;

pub use action::{Action, MenuId};
pub use state::{ConversationState, ConversationStore};

use crate::auth::{AuthOutcome, SessionStore};
use crate::wallet::keys;
use crate::wallet::store::{WalletStore, WalletStoreError};
use std::sync::Arc;
use tracing::{error, info};

/// The user behind an inbound update
#[derive(Clone, Debug)]
pub struct UserRef {
    /// Stable Telegram user id
    pub id: i64,
    /// Display name, kept current on wallet writes
    pub display_name: String,
}

/// One unit of user input
#[derive(Clone, Debug)]
pub enum Input {
    /// A plain text message
    Text(String),
    /// An inline-button action
    Action(Action),
}

/// What the transport layer should do with the result of a transition
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    /// Send a text reply (HTML)
    Reply(String),
    /// Render a menu screen
    ShowMenu(MenuId),
    /// Emit the uniform "not authenticated" signal, subject to cooldown
    NotAuthenticated,
    /// Nothing to do (stale callback, empty input)
    None,
}

const CODE_PROMPT: &str = "🔑 Send the access code.";
const IMPORT_PROMPT: &str =
    "📥 Send the base-58 encoded private key of the wallet to import, or /cancel.";
const NAME_PROMPT: &str = "✏️ Send a name for this wallet, or /cancel.";
const FLOW_BUSY: &str = "⚠️ Finish the current step first, or send /cancel.";
const GENERIC_FAILURE: &str = "❌ Something went wrong, please try again later.";

/// Per-user finite-state machine over the wallet store and session gate
pub struct ConversationEngine {
    sessions: SessionStore,
    conversations: ConversationStore,
    wallets: Arc<WalletStore>,
}

impl ConversationEngine {
    #[must_use]
    pub fn new(sessions: SessionStore, wallets: Arc<WalletStore>) -> Self {
        Self {
            sessions,
            conversations: ConversationStore::new(),
            wallets,
        }
    }

    /// The session gate, exposed for status checks
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Current state of a user's dialogue
    pub async fn current_state(&self, user_id: i64) -> ConversationState {
        let cell = self.conversations.cell(user_id).await;
        let state = cell.lock().await;
        state.clone()
    }

    /// Advance the user's state machine with one unit of input.
    ///
    /// The per-user state lock is held across the whole call, so messages
    /// from one user are processed strictly in arrival order while other
    /// users proceed concurrently.
    pub async fn advance(&self, user: &UserRef, input: Input) -> Effect {
        let cell = self.conversations.cell(user.id).await;
        let mut state = cell.lock().await;

        // Access-code entry is the one path reachable in any auth status
        if let Input::Action(Action::EnterAccessCode) = &input {
            *state = ConversationState::AwaitingAccessCode;
            return Effect::Reply(CODE_PROMPT.to_string());
        }

        if *state == ConversationState::AwaitingAccessCode {
            if let Input::Text(text) = &input {
                // Exactly one attempt per message
                *state = ConversationState::Idle;
                return self.check_access_code(user, text.trim()).await;
            }
        }

        if !self.sessions.is_authenticated(user.id).await {
            return Effect::NotAuthenticated;
        }

        match input {
            Input::Action(action) => self.route_action(user, action, &mut state).await,
            Input::Text(text) => self.continue_flow(user, &text, &mut state).await,
        }
    }

    async fn check_access_code(&self, user: &UserRef, submitted: &str) -> Effect {
        match self.sessions.authenticate(user.id, submitted).await {
            AuthOutcome::Accepted => {
                info!("User {} authenticated.", user.id);
                Effect::Reply("✅ Correct code. Use /menu to get started.".to_string())
            }
            AuthOutcome::AlreadyAuthenticated => {
                Effect::Reply("You are already authenticated.".to_string())
            }
            AuthOutcome::Rejected => Effect::Reply("❌ Wrong access code.".to_string()),
        }
    }

    async fn route_action(
        &self,
        user: &UserRef,
        action: Action,
        state: &mut ConversationState,
    ) -> Effect {
        match action {
            // Handled before the gate; repeating the prompt keeps the match total
            Action::EnterAccessCode => {
                *state = ConversationState::AwaitingAccessCode;
                Effect::Reply(CODE_PROMPT.to_string())
            }
            Action::ShowMenu => Effect::ShowMenu(MenuId::Main),
            Action::ListWallets => Effect::ShowMenu(MenuId::Wallets),
            Action::Cancel => {
                *state = ConversationState::Idle;
                Effect::Reply("Cancelled.".to_string())
            }
            Action::CreateWallet => self.create_fresh_wallet(user).await,
            Action::ImportWallet => {
                if *state != ConversationState::Idle {
                    return Effect::Reply(FLOW_BUSY.to_string());
                }
                *state = ConversationState::AwaitingPrivateKey;
                Effect::Reply(IMPORT_PROMPT.to_string())
            }
            Action::SetDefault(wallet_id) => {
                match self.wallets.set_default_wallet(user.id, wallet_id).await {
                    Ok(()) => Effect::ShowMenu(MenuId::Wallets),
                    Err(WalletStoreError::NotFound) => {
                        Effect::Reply("That wallet does not exist.".to_string())
                    }
                    Err(e) => internal_failure(&e),
                }
            }
        }
    }

    async fn continue_flow(
        &self,
        user: &UserRef,
        text: &str,
        state: &mut ConversationState,
    ) -> Effect {
        match state.clone() {
            // Plain text outside any flow goes back to the menu
            ConversationState::Idle => Effect::ShowMenu(MenuId::Main),
            ConversationState::AwaitingAccessCode => Effect::Reply(CODE_PROMPT.to_string()),
            ConversationState::AwaitingPrivateKey => match keys::decode_private_key(text) {
                Ok(pair) => {
                    let reply = format!(
                        "Recognized address <code>{}</code>.\n\n{NAME_PROMPT}",
                        pair.public_key
                    );
                    *state = ConversationState::AwaitingWalletName {
                        public_key: pair.public_key,
                        private_key: pair.private_key,
                    };
                    Effect::Reply(reply)
                }
                // No state change: the user may resubmit indefinitely
                Err(e) => Effect::Reply(format!("❌ Could not decode that key ({e}). Try again, or /cancel.")),
            },
            ConversationState::AwaitingWalletName {
                public_key,
                private_key,
            } => {
                let label = text.trim();
                if label.is_empty() {
                    return Effect::Reply(NAME_PROMPT.to_string());
                }
                // Terminal transition either way; the pending payload is dropped
                *state = ConversationState::Idle;
                self.finish_import(user, label, &public_key, &private_key)
                    .await
            }
        }
    }

    async fn finish_import(
        &self,
        user: &UserRef,
        label: &str,
        public_key: &str,
        private_key: &str,
    ) -> Effect {
        let created = self
            .wallets
            .create_wallet(user.id, &user.display_name, label, public_key, private_key)
            .await;

        match created {
            Ok(_) => {
                info!("User {} imported a wallet.", user.id);
                Effect::Reply(wallet_ready_reply("imported", label, public_key, private_key))
            }
            Err(WalletStoreError::DuplicateKey) => Effect::Reply(
                "⚠️ That key is already stored. The import was discarded.".to_string(),
            ),
            Err(e) => internal_failure(&e),
        }
    }

    async fn create_fresh_wallet(&self, user: &UserRef) -> Effect {
        let count = match self.wallets.count_wallets(user.id).await {
            Ok(count) => count,
            Err(e) => return internal_failure(&e),
        };

        let pair = keys::generate();
        let label = format!("W{}", count + 1);
        let created = self
            .wallets
            .create_wallet(
                user.id,
                &user.display_name,
                &label,
                &pair.public_key,
                &pair.private_key,
            )
            .await;

        match created {
            Ok(_) => {
                info!("User {} created a wallet.", user.id);
                Effect::Reply(wallet_ready_reply(
                    "created",
                    &label,
                    &pair.public_key,
                    &pair.private_key,
                ))
            }
            Err(e) => internal_failure(&e),
        }
    }
}

fn wallet_ready_reply(verb: &str, label: &str, public_key: &str, private_key: &str) -> String {
    format!(
        "✅ Wallet <b>{}</b> {verb}.\n\n\
         Address: <code>{public_key}</code>\n\
         Private key: <code>{private_key}</code>\n\n\
         ⚠️ Store the private key somewhere safe. Anyone holding it controls the funds.",
        html_escape::encode_text(label)
    )
}

fn internal_failure(e: &WalletStoreError) -> Effect {
    error!("Wallet store failure: {}", e);
    Effect::Reply(GENERIC_FAILURE.to_string())
}
