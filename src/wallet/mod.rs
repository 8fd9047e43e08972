/// Balance lookups against the ledger RPC node
pub mod balance;
/// Keypair generation and private-key import
pub mod keys;
/// Persistent wallet records
pub mod store;
