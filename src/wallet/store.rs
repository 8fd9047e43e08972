//! Persistent wallet storage over SQLite.
//!
//! The store owns the schema: public and private keys are UNIQUE columns,
//! and the user's default-wallet pointer is a nullable reference that is
//! never left dangling. All multi-step mutations run inside a transaction.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during wallet storage operations
#[derive(Debug, Error)]
pub enum WalletStoreError {
    /// Public or private key collides with a stored wallet
    #[error("public or private key already stored")]
    DuplicateKey,
    /// No matching wallet (or it belongs to someone else)
    #[error("wallet not found")]
    NotFound,
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored custodial wallet
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Wallet {
    /// Row id
    pub id: i64,
    /// Owning Telegram user id
    pub user_id: i64,
    /// Human-readable label chosen at creation
    pub label: String,
    /// Base-58 public address
    pub public_key: String,
    /// Base-58 encoded secret
    pub private_key: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed wallet and user persistence
pub struct WalletStore {
    pool: SqlitePool,
}

impl WalletStore {
    /// Open (and create if missing) the database behind `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub async fn connect(url: &str) -> Result<Self, WalletStoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // An in-memory database exists per connection; a single connection
        // keeps every query on the same database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<(), WalletStoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id                INTEGER PRIMARY KEY,
                display_name      TEXT NOT NULL,
                default_wallet_id INTEGER REFERENCES wallets(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS wallets (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                label       TEXT NOT NULL,
                public_key  TEXT NOT NULL UNIQUE,
                private_key TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        info!("Wallet database ready.");
        Ok(())
    }

    /// Store a wallet for the user, creating the user row on first contact.
    ///
    /// The user's first wallet becomes the default; the check and the insert
    /// share one transaction so a concurrent creation cannot race it.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` when either key column collides with a stored wallet,
    /// `Database` on any other failure. Nothing is written in either case.
    pub async fn create_wallet(
        &self,
        user_id: i64,
        display_name: &str,
        label: &str,
        public_key: &str,
        private_key: &str,
    ) -> Result<i64, WalletStoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, display_name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "INSERT INTO wallets (user_id, label, public_key, private_key, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(label)
        .bind(public_key)
        .bind(private_key)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let wallet_id = result.last_insert_rowid();

        sqlx::query("UPDATE users SET default_wallet_id = ? WHERE id = ? AND default_wallet_id IS NULL")
            .bind(wallet_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(wallet_id)
    }

    /// All wallets of a user, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure.
    pub async fn list_wallets(&self, user_id: i64) -> Result<Vec<Wallet>, WalletStoreError> {
        let wallets = sqlx::query_as::<_, Wallet>(
            "SELECT * FROM wallets WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(wallets)
    }

    /// The wallet the user's balance queries resolve to.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user has no default wallet set.
    pub async fn default_wallet(&self, user_id: i64) -> Result<Wallet, WalletStoreError> {
        sqlx::query_as::<_, Wallet>(
            "SELECT w.* FROM wallets w
             JOIN users u ON u.default_wallet_id = w.id
             WHERE u.id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(WalletStoreError::NotFound)
    }

    /// Point the user's default at one of their own wallets.
    ///
    /// # Errors
    ///
    /// `NotFound` when the wallet does not exist or belongs to another user.
    pub async fn set_default_wallet(
        &self,
        user_id: i64,
        wallet_id: i64,
    ) -> Result<(), WalletStoreError> {
        let result = sqlx::query(
            "UPDATE users SET default_wallet_id = ?
             WHERE id = ?
               AND EXISTS (SELECT 1 FROM wallets WHERE id = ? AND user_id = ?)",
        )
        .bind(wallet_id)
        .bind(user_id)
        .bind(wallet_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WalletStoreError::NotFound);
        }
        Ok(())
    }

    /// Number of wallets the user owns.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure.
    pub async fn count_wallets(&self, user_id: i64) -> Result<i64, WalletStoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM wallets WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Delete a wallet, clearing the user's default pointer if it pointed at
    /// the deleted row.
    ///
    /// # Errors
    ///
    /// `NotFound` when the wallet does not exist or belongs to another user.
    pub async fn delete_wallet(
        &self,
        user_id: i64,
        wallet_id: i64,
    ) -> Result<(), WalletStoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET default_wallet_id = NULL WHERE id = ? AND default_wallet_id = ?")
            .bind(user_id)
            .bind(wallet_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM wallets WHERE id = ? AND user_id = ?")
            .bind(wallet_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the default-pointer update
            return Err(WalletStoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Close the underlying pool. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_unique_violation(e: sqlx::Error) -> WalletStoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => WalletStoreError::DuplicateKey,
        _ => WalletStoreError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> WalletStore {
        WalletStore::connect("sqlite::memory:")
            .await
            .expect("in-memory store")
    }

    #[tokio::test]
    async fn test_first_wallet_becomes_default() -> Result<(), WalletStoreError> {
        let store = store().await;

        let id = store.create_wallet(1, "alice", "Main", "pub-a", "priv-a").await?;
        assert_eq!(store.count_wallets(1).await?, 1);
        assert_eq!(store.default_wallet(1).await?.id, id);

        // The second wallet does not steal the default
        store.create_wallet(1, "alice", "Spare", "pub-b", "priv-b").await?;
        assert_eq!(store.default_wallet(1).await?.id, id);
        assert_eq!(store.count_wallets(1).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_keys_rejected() -> Result<(), WalletStoreError> {
        let store = store().await;

        store.create_wallet(1, "alice", "Main", "pub-a", "priv-a").await?;

        let same_public = store.create_wallet(2, "bob", "Other", "pub-a", "priv-x").await;
        assert!(matches!(same_public, Err(WalletStoreError::DuplicateKey)));

        let same_private = store.create_wallet(2, "bob", "Other", "pub-x", "priv-a").await;
        assert!(matches!(same_private, Err(WalletStoreError::DuplicateKey)));

        // The failed inserts left no rows behind
        assert_eq!(store.count_wallets(2).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_default_checks_ownership() -> Result<(), WalletStoreError> {
        let store = store().await;

        let alice_wallet = store.create_wallet(1, "alice", "Main", "pub-a", "priv-a").await?;
        store.create_wallet(2, "bob", "Main", "pub-b", "priv-b").await?;

        let stolen = store.set_default_wallet(2, alice_wallet).await;
        assert!(matches!(stolen, Err(WalletStoreError::NotFound)));

        let second = store.create_wallet(1, "alice", "Spare", "pub-c", "priv-c").await?;
        store.set_default_wallet(1, second).await?;
        assert_eq!(store.default_wallet(1).await?.id, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_clears_dangling_default() -> Result<(), WalletStoreError> {
        let store = store().await;

        let id = store.create_wallet(1, "alice", "Main", "pub-a", "priv-a").await?;
        store.delete_wallet(1, id).await?;

        assert!(matches!(
            store.default_wallet(1).await,
            Err(WalletStoreError::NotFound)
        ));
        assert_eq!(store.count_wallets(1).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_checks_ownership() -> Result<(), WalletStoreError> {
        let store = store().await;

        let id = store.create_wallet(1, "alice", "Main", "pub-a", "priv-a").await?;
        let result = store.delete_wallet(2, id).await;
        assert!(matches!(result, Err(WalletStoreError::NotFound)));

        // Alice's default is untouched by the failed delete
        assert_eq!(store.default_wallet(1).await?.id, id);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() -> Result<(), WalletStoreError> {
        let store = store().await;

        store.create_wallet(1, "alice", "First", "pub-a", "priv-a").await?;
        store.create_wallet(1, "alice", "Second", "pub-b", "priv-b").await?;
        store.create_wallet(1, "alice", "Third", "pub-c", "priv-c").await?;

        let labels: Vec<String> = store
            .list_wallets(1)
            .await?
            .into_iter()
            .map(|w| w.label)
            .collect();
        assert_eq!(labels, vec!["First", "Second", "Third"]);
        Ok(())
    }
}
