//! Best-effort balance lookups.
//!
//! A failing node must never block a menu render, so every lookup is a
//! single attempt and any failure degrades to a zero balance with a logged
//! warning.

use crate::config::{BALANCE_DISPLAY_DECIMALS, LAMPORTS_PER_SOL};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::warn;

/// Resolves a public address into its current balance
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Current balance in lamports; `0` on any failure
    async fn balance_lamports(&self, public_key: &str) -> u64;
}

/// Oracle backed by a Solana JSON-RPC node
pub struct RpcBalanceOracle {
    client: RpcClient,
}

impl RpcBalanceOracle {
    #[must_use]
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new(rpc_url.to_string()),
        }
    }
}

#[async_trait]
impl BalanceOracle for RpcBalanceOracle {
    async fn balance_lamports(&self, public_key: &str) -> u64 {
        let pubkey = match Pubkey::from_str(public_key) {
            Ok(pubkey) => pubkey,
            Err(e) => {
                warn!("Balance lookup skipped for bad address {}: {}", public_key, e);
                return 0;
            }
        };

        match self.client.get_balance(&pubkey).await {
            Ok(lamports) => lamports,
            Err(e) => {
                warn!("Balance lookup failed for {}: {}", public_key, e);
                0
            }
        }
    }
}

/// Render a lamport amount as SOL with four decimal places
#[must_use]
pub fn format_sol(lamports: u64) -> String {
    let sol = lamports as f64 / LAMPORTS_PER_SOL as f64;
    format!("{sol:.prec$} SOL", prec = BALANCE_DISPLAY_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_displays_as_zero_sol() {
        assert_eq!(format_sol(0), "0.0000 SOL");
    }

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(format_sol(LAMPORTS_PER_SOL), "1.0000 SOL");
        assert_eq!(format_sol(1_500_000_000), "1.5000 SOL");
        assert_eq!(format_sol(123_456), "0.0001 SOL");
    }
}
