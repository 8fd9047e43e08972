/// Cooldown for repeated "not authenticated" replies
pub mod denial_cache;
/// Command and message handlers bridging updates into the engine
pub mod handlers;
/// Menu texts and inline keyboards
pub mod views;

pub use denial_cache::DenialCache;
