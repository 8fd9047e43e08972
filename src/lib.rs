//! Custodial Solana wallet bot for Telegram.
//!
//! Users authenticate with a shared access code, then create or import
//! base-58 encoded Solana keypairs that the bot keeps in SQLite and
//! reconciles with live balances from a JSON-RPC node.

/// Access-code verification and session tracking
pub mod auth;
/// Telegram transport: handlers, views, flood protection
pub mod bot;
/// Configuration and settings management
pub mod config;
/// Per-user conversation state machine
pub mod engine;
/// Wallet records, key material, balances
pub mod wallet;
