use dotenvy::dotenv;
use regex::Regex;
use solwallet_bot::auth::{AccessCodeVerifier, SessionStore};
use solwallet_bot::bot::handlers::{self, BotDeps, Command};
use solwallet_bot::bot::DenialCache;
use solwallet_bot::config::{get_denial_cache_max_size, get_denial_cooldown, Settings};
use solwallet_bot::engine::ConversationEngine;
use solwallet_bot::wallet::balance::RpcBalanceOracle;
use solwallet_bot::wallet::store::WalletStore;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data from log output
struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    secret_b58: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            // base-58 of a 64-byte secret is 85-90 characters
            secret_b58: Regex::new(r"[1-9A-HJ-NP-Za-km-z]{85,90}")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .secret_b58
            .replace_all(&output, "[PRIVATE_KEY]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Solana wallet bot...");

    let settings = init_settings();
    let wallets = init_wallet_store(&settings).await;

    let sessions = SessionStore::new(AccessCodeVerifier::new(&settings.access_code));
    let engine = ConversationEngine::new(sessions, wallets.clone());
    let oracle = Arc::new(RpcBalanceOracle::new(&settings.solana_rpc_url));
    info!("Balance oracle pointed at {}.", settings.solana_rpc_url);

    let denials = init_denial_cache();
    let deps = Arc::new(BotDeps {
        engine,
        wallets: wallets.clone(),
        oracle,
        denials,
    });

    let bot = Bot::new(settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // The ctrl-c handler stopped the dispatcher; close storage before exit
    wallets.close().await;
    info!("Wallet database closed, exiting.");

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_wallet_store(settings: &Settings) -> Arc<WalletStore> {
    match WalletStore::connect(&settings.database_url).await {
        Ok(store) => {
            info!("Connected to {}.", settings.database_url);
            Arc::new(store)
        }
        Err(e) => {
            error!("Failed to open wallet database: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_denial_cache() -> DenialCache {
    let cooldown = get_denial_cooldown();
    let max_size = get_denial_cache_max_size();

    info!(
        "Initializing DenialCache (cooldown: {}s, max_size: {})",
        cooldown, max_size
    );

    DenialCache::new(cooldown, max_size)
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    Update::filter_message()
                        .filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    deps: Arc<BotDeps>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::command(bot, msg, cmd, deps).await {
        error!("Command handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    deps: Arc<BotDeps>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::text(bot, msg, deps).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    deps: Arc<BotDeps>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::callback(bot, q, deps).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
