//! Flood protection for pre-authentication replies.
//!
//! An unauthenticated user (or a bot probing the chat) can send messages at
//! an arbitrary rate; answering each one with the same "not authenticated"
//! prompt would flood the chat and run into Telegram rate limits. Each user
//! gets the prompt once per cooldown window, while silenced attempts are
//! still counted and logged with throttling.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Tracks which users received the "not authenticated" prompt recently
pub struct DenialCache {
    /// Users currently in cooldown; entries expire on their own
    cache: Cache<i64, ()>,
    /// Counter for silenced attempts (for log throttling)
    silenced: AtomicU64,
}

impl DenialCache {
    /// # Arguments
    ///
    /// * `cooldown_secs` - seconds between prompts to the same user
    /// * `max_capacity` - maximum number of tracked users
    #[must_use]
    pub fn new(cooldown_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(cooldown_secs))
            .build();

        Self {
            cache,
            silenced: AtomicU64::new(0),
        }
    }

    /// Whether the uniform prompt should be sent to this user now.
    ///
    /// Only every 100th silenced attempt is logged to prevent log flooding.
    pub async fn should_prompt(&self, user_id: i64) -> bool {
        if self.cache.get(&user_id).await.is_none() {
            return true;
        }

        let count = self.silenced.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(100) {
            debug!(
                "🔒 Silenced {} unauthenticated prompts (recent: user {})",
                count, user_id
            );
        }

        false
    }

    /// Start the cooldown window after a prompt was actually sent
    pub async fn mark_prompted(&self, user_id: i64) {
        self.cache.insert(user_id, ()).await;
    }

    /// Total number of silenced attempts so far
    #[must_use]
    pub fn silenced(&self) -> u64 {
        self.silenced.load(Ordering::Relaxed)
    }
}
