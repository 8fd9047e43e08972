//! Menu texts and inline keyboards.
//!
//! All user-facing screen rendering lives here; the engine only names the
//! screen. Wallet labels are user input and get HTML-escaped before they
//! land in a message body.

use crate::engine::{Action, MenuId};
use crate::wallet::balance::{format_sol, BalanceOracle};
use crate::wallet::store::{WalletStore, WalletStoreError};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// A rendered screen ready for `send_message`
pub struct MenuView {
    /// HTML message body
    pub text: String,
    /// Inline buttons below the message
    pub keyboard: InlineKeyboardMarkup,
}

fn button(label: &str, action: &Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.callback_data())
}

/// The pre-authentication welcome screen
#[must_use]
pub fn welcome() -> MenuView {
    MenuView {
        text: "🪐 <b>Welcome!</b>\n\n\
               This bot keeps custodial Solana wallets for you.\n\
               Enter the access code to get started."
            .to_string(),
        keyboard: InlineKeyboardMarkup::new(vec![vec![button(
            "🔑 Enter access code",
            &Action::EnterAccessCode,
        )]]),
    }
}

/// Render the screen named by the engine.
///
/// Balance lookups inside are best-effort; only storage failures bubble up.
///
/// # Errors
///
/// Returns a `WalletStoreError` when the wallet store cannot be read.
pub async fn render_menu(
    menu: MenuId,
    user_id: i64,
    wallets: &WalletStore,
    oracle: &dyn BalanceOracle,
) -> Result<MenuView, WalletStoreError> {
    match menu {
        MenuId::Main => main_menu(user_id, wallets, oracle).await,
        MenuId::Wallets => wallets_menu(user_id, wallets, oracle).await,
    }
}

async fn main_menu(
    user_id: i64,
    wallets: &WalletStore,
    oracle: &dyn BalanceOracle,
) -> Result<MenuView, WalletStoreError> {
    let text = match wallets.default_wallet(user_id).await {
        Ok(wallet) => {
            let balance = oracle.balance_lamports(&wallet.public_key).await;
            format!(
                "🪐 <b>Main menu</b>\n\n\
                 💳 Default wallet:\n\
                 → <b>{}</b> — {}\n\
                 <code>{}</code>",
                html_escape::encode_text(&wallet.label),
                format_sol(balance),
                wallet.public_key
            )
        }
        Err(WalletStoreError::NotFound) => {
            "🪐 <b>Main menu</b>\n\n💳 You have no wallets yet. Create or import one below."
                .to_string()
        }
        Err(e) => return Err(e),
    };

    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            button("🆕 Create wallet", &Action::CreateWallet),
            button("📥 Import wallet", &Action::ImportWallet),
        ],
        vec![button("💳 My wallets", &Action::ListWallets)],
    ]);

    Ok(MenuView { text, keyboard })
}

async fn wallets_menu(
    user_id: i64,
    wallets: &WalletStore,
    oracle: &dyn BalanceOracle,
) -> Result<MenuView, WalletStoreError> {
    let owned = wallets.list_wallets(user_id).await?;
    let default_id = wallets.default_wallet(user_id).await.ok().map(|w| w.id);

    let mut lines = vec!["💳 <b>Your wallets</b>".to_string()];
    let mut rows = Vec::new();

    if owned.is_empty() {
        lines.push("(none yet)".to_string());
    }

    for wallet in &owned {
        let balance = oracle.balance_lamports(&wallet.public_key).await;
        let marker = if Some(wallet.id) == default_id { " ★" } else { "" };
        lines.push(format!(
            "→ <b>{}</b>{marker} — {}\n<code>{}</code>",
            html_escape::encode_text(&wallet.label),
            format_sol(balance),
            wallet.public_key
        ));
        if Some(wallet.id) != default_id {
            rows.push(vec![button(
                &format!("Make \"{}\" default", wallet.label),
                &Action::SetDefault(wallet.id),
            )]);
        }
    }

    rows.push(vec![button("← Back", &Action::ShowMenu)]);

    Ok(MenuView {
        text: lines.join("\n\n"),
        keyboard: InlineKeyboardMarkup::new(rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Oracle standing in for an unreachable node
    struct DownOracle;

    #[async_trait]
    impl BalanceOracle for DownOracle {
        async fn balance_lamports(&self, _public_key: &str) -> u64 {
            0
        }
    }

    #[tokio::test]
    async fn test_main_menu_degrades_balance_to_zero() -> Result<(), WalletStoreError> {
        let store = WalletStore::connect("sqlite::memory:").await?;
        store
            .create_wallet(1, "alice", "Main <x>", "pub-a", "priv-a")
            .await?;

        let view = render_menu(MenuId::Main, 1, &store, &DownOracle).await?;
        assert!(view.text.contains("0.0000 SOL"));
        // Label is escaped, secret never shown on menus
        assert!(view.text.contains("Main &lt;x&gt;"));
        assert!(!view.text.contains("priv-a"));
        Ok(())
    }

    #[tokio::test]
    async fn test_wallets_menu_marks_default() -> Result<(), WalletStoreError> {
        let store = WalletStore::connect("sqlite::memory:").await?;
        store.create_wallet(1, "alice", "First", "pub-a", "priv-a").await?;
        store.create_wallet(1, "alice", "Second", "pub-b", "priv-b").await?;

        let view = render_menu(MenuId::Wallets, 1, &store, &DownOracle).await?;
        assert!(view.text.contains("First</b> ★"));
        assert!(view.text.contains("Second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_wallet_list_renders() -> Result<(), WalletStoreError> {
        let store = WalletStore::connect("sqlite::memory:").await?;
        let view = render_menu(MenuId::Wallets, 1, &store, &DownOracle).await?;
        assert!(view.text.contains("none yet"));
        Ok(())
    }
}
