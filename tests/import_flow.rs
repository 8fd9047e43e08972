//! End-to-end conversation flows against an in-memory wallet store.

use async_trait::async_trait;
use solwallet_bot::auth::{AccessCodeVerifier, SessionStore};
use solwallet_bot::bot::views;
use solwallet_bot::engine::{
    Action, ConversationEngine, ConversationState, Effect, Input, MenuId, UserRef,
};
use solwallet_bot::wallet::balance::BalanceOracle;
use solwallet_bot::wallet::keys;
use solwallet_bot::wallet::store::WalletStore;
use std::sync::Arc;

/// Oracle standing in for a node that times out on every call
struct DownOracle;

#[async_trait]
impl BalanceOracle for DownOracle {
    async fn balance_lamports(&self, _public_key: &str) -> u64 {
        0
    }
}

struct Harness {
    engine: ConversationEngine,
    wallets: Arc<WalletStore>,
}

async fn harness() -> Harness {
    let wallets = Arc::new(
        WalletStore::connect("sqlite::memory:")
            .await
            .expect("in-memory store"),
    );
    let engine = ConversationEngine::new(
        SessionStore::new(AccessCodeVerifier::new("1234")),
        wallets.clone(),
    );
    Harness { engine, wallets }
}

fn user() -> UserRef {
    UserRef {
        id: 42,
        display_name: "Alice".to_string(),
    }
}

fn reply_text(effect: Effect) -> String {
    match effect {
        Effect::Reply(text) => text,
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_import_scenario() {
    let h = harness().await;
    let user = user();

    // Access-code gate
    h.engine
        .advance(&user, Input::Action(Action::EnterAccessCode))
        .await;
    let reply = reply_text(h.engine.advance(&user, Input::Text("1234".to_string())).await);
    assert!(reply.contains("Correct code"));
    assert!(h.engine.sessions().is_authenticated(user.id).await);

    // Import trigger
    h.engine
        .advance(&user, Input::Action(Action::ImportWallet))
        .await;
    assert_eq!(
        h.engine.current_state(user.id).await,
        ConversationState::AwaitingPrivateKey
    );

    // A valid base-58 encoded 64-byte secret moves the flow forward,
    // carrying the derived public key in the state payload
    let pair = keys::generate();
    h.engine
        .advance(&user, Input::Text(pair.private_key.clone()))
        .await;
    match h.engine.current_state(user.id).await {
        ConversationState::AwaitingWalletName { public_key, .. } => {
            assert_eq!(public_key, pair.public_key);
        }
        other => panic!("expected AwaitingWalletName, got {other:?}"),
    }

    // Nothing is stored until the wallet is named
    assert_eq!(h.wallets.count_wallets(user.id).await.expect("count"), 0);

    // Naming commits the wallet and echoes both keys back
    let reply = reply_text(
        h.engine
            .advance(&user, Input::Text("MyWallet".to_string()))
            .await,
    );
    assert!(reply.contains(&pair.public_key));
    assert!(reply.contains(&pair.private_key));
    assert_eq!(h.engine.current_state(user.id).await, ConversationState::Idle);

    let wallets = h.wallets.list_wallets(user.id).await.expect("list");
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0].label, "MyWallet");

    // The first wallet is also the default
    let default = h.wallets.default_wallet(user.id).await.expect("default");
    assert_eq!(default.public_key, pair.public_key);
}

#[tokio::test]
async fn test_unauthenticated_user_sees_uniform_signal() {
    let h = harness().await;
    let user = user();

    for input in [
        Input::Text("hello".to_string()),
        Input::Action(Action::ShowMenu),
        Input::Action(Action::CreateWallet),
        Input::Action(Action::ImportWallet),
    ] {
        assert_eq!(h.engine.advance(&user, input).await, Effect::NotAuthenticated);
    }
    assert_eq!(h.wallets.count_wallets(user.id).await.expect("count"), 0);
}

#[tokio::test]
async fn test_overlapping_imports_complete_only_once() {
    let h = harness().await;
    let user = user();

    h.engine
        .advance(&user, Input::Action(Action::EnterAccessCode))
        .await;
    h.engine.advance(&user, Input::Text("1234".to_string())).await;

    // First import reaches the naming step
    h.engine
        .advance(&user, Input::Action(Action::ImportWallet))
        .await;
    let first = keys::generate();
    h.engine
        .advance(&user, Input::Text(first.private_key))
        .await;

    // A second import trigger before the first finishes is rejected and
    // does not disturb the pending payload
    let reply = reply_text(
        h.engine
            .advance(&user, Input::Action(Action::ImportWallet))
            .await,
    );
    assert!(reply.contains("current step"));

    h.engine
        .advance(&user, Input::Text("OnlyWallet".to_string()))
        .await;
    assert_eq!(h.wallets.count_wallets(user.id).await.expect("count"), 1);
    let wallets = h.wallets.list_wallets(user.id).await.expect("list");
    assert_eq!(wallets[0].public_key, first.public_key);
}

#[tokio::test]
async fn test_menu_renders_zero_when_oracle_is_down() {
    let h = harness().await;
    let user = user();

    h.engine
        .advance(&user, Input::Action(Action::EnterAccessCode))
        .await;
    h.engine.advance(&user, Input::Text("1234".to_string())).await;

    let create = h.engine.advance(&user, Input::Action(Action::CreateWallet)).await;
    assert!(matches!(create, Effect::Reply(text) if text.contains("created")));

    // The menu still renders, with the balance degraded to zero
    assert_eq!(
        h.engine.advance(&user, Input::Action(Action::ShowMenu)).await,
        Effect::ShowMenu(MenuId::Main)
    );
    let view = views::render_menu(MenuId::Main, user.id, &h.wallets, &DownOracle)
        .await
        .expect("menu renders");
    assert!(view.text.contains("0.0000 SOL"));
}

#[tokio::test]
async fn test_distinct_users_do_not_share_flows() {
    let h = harness().await;
    let alice = user();
    let bob = UserRef {
        id: 43,
        display_name: "Bob".to_string(),
    };

    for u in [&alice, &bob] {
        h.engine.advance(u, Input::Action(Action::EnterAccessCode)).await;
        h.engine.advance(u, Input::Text("1234".to_string())).await;
    }

    h.engine
        .advance(&alice, Input::Action(Action::ImportWallet))
        .await;
    assert_eq!(
        h.engine.current_state(alice.id).await,
        ConversationState::AwaitingPrivateKey
    );
    // Bob's state machine is untouched by Alice's flow
    assert_eq!(h.engine.current_state(bob.id).await, ConversationState::Idle);
}
