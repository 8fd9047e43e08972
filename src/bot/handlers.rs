//! Telegram update handlers.
//!
//! Thin bridge between teloxide updates and the conversation engine: decode
//! the update into an [`Input`], advance the engine, render the resulting
//! [`Effect`].

use crate::bot::denial_cache::DenialCache;
use crate::bot::views;
use crate::engine::{Action, ConversationEngine, Effect, Input, UserRef};
use crate::wallet::balance::BalanceOracle;
use crate::wallet::store::WalletStore;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::error;

/// Supported slash commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "Show the welcome screen.")]
    Start,
    #[command(description = "Open the main menu.")]
    Menu,
    #[command(description = "Abandon the current flow.")]
    Cancel,
    #[command(description = "Liveness probe.")]
    Healthcheck,
}

/// Shared handler dependencies, injected once through the dispatcher
pub struct BotDeps {
    /// The per-user state machine
    pub engine: ConversationEngine,
    /// Wallet records, shared with the engine
    pub wallets: Arc<WalletStore>,
    /// Balance lookups for menu rendering
    pub oracle: Arc<dyn BalanceOracle>,
    /// Cooldown for "not authenticated" replies
    pub denials: DenialCache,
}

fn user_ref(msg: &Message) -> Option<UserRef> {
    msg.from.as_ref().map(|u| UserRef {
        id: u.id.0.cast_signed(),
        display_name: u.first_name.clone(),
    })
}

/// Handle a slash command.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn command(bot: Bot, msg: Message, cmd: Command, deps: Arc<BotDeps>) -> Result<()> {
    match cmd {
        Command::Start => {
            let view = views::welcome();
            bot.send_message(msg.chat.id, view.text)
                .parse_mode(ParseMode::Html)
                .reply_markup(view.keyboard)
                .await?;
            Ok(())
        }
        Command::Healthcheck => {
            bot.send_message(msg.chat.id, "OK").await?;
            Ok(())
        }
        Command::Menu => dispatch(&bot, &msg, Input::Action(Action::ShowMenu), &deps).await,
        Command::Cancel => dispatch(&bot, &msg, Input::Action(Action::Cancel), &deps).await,
    }
}

/// Handle a plain text message.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn text(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> Result<()> {
    let Some(body) = msg.text() else {
        return Ok(());
    };
    dispatch(&bot, &msg, Input::Text(body.to_string()), &deps).await
}

/// Handle an inline-button callback.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails or the callback carries no
/// originating chat.
pub async fn callback(bot: Bot, q: CallbackQuery, deps: Arc<BotDeps>) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let chat_id = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .ok_or_else(|| anyhow!("Callback without originating chat"))?;
    let user = UserRef {
        id: q.from.id.0.cast_signed(),
        display_name: q.from.first_name.clone(),
    };

    let effect = match Action::parse(data) {
        Some(action) => deps.engine.advance(&user, Input::Action(action)).await,
        // Stale or foreign payload, nothing to do
        None => Effect::None,
    };

    render_effect(&bot, chat_id, user.id, effect, &deps).await
}

async fn dispatch(bot: &Bot, msg: &Message, input: Input, deps: &BotDeps) -> Result<()> {
    let Some(user) = user_ref(msg) else {
        return Ok(());
    };
    let effect = deps.engine.advance(&user, input).await;
    render_effect(bot, msg.chat.id, user.id, effect, deps).await
}

async fn render_effect(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    effect: Effect,
    deps: &BotDeps,
) -> Result<()> {
    match effect {
        Effect::None => Ok(()),
        Effect::Reply(body) => {
            bot.send_message(chat_id, body)
                .parse_mode(ParseMode::Html)
                .await?;
            Ok(())
        }
        Effect::ShowMenu(menu) => {
            match views::render_menu(menu, user_id, &deps.wallets, deps.oracle.as_ref()).await {
                Ok(view) => {
                    bot.send_message(chat_id, view.text)
                        .parse_mode(ParseMode::Html)
                        .reply_markup(view.keyboard)
                        .await?;
                }
                Err(e) => {
                    error!("Menu render failed for user {}: {}", user_id, e);
                    bot.send_message(chat_id, "❌ Something went wrong, please try again later.")
                        .await?;
                }
            }
            Ok(())
        }
        Effect::NotAuthenticated => {
            if deps.denials.should_prompt(user_id).await {
                bot.send_message(
                    chat_id,
                    "🔒 Not authenticated. Use /start and enter the access code.",
                )
                .await?;
                deps.denials.mark_prompted(user_id).await;
            }
            Ok(())
        }
    }
}
