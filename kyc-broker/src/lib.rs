//! KYC Credential Broker
//!
//! HTTP service turning scanned identity documents into accounts:
//! QR extraction, deterministic credential issuance, JWT auth and an
//! audit trail over pluggable storage.

pub mod audit;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod tokens;

pub use config::Config;
pub use error::BrokerError;
pub use state::AppState;
pub use store::{
    AccountStore, AuditStore, InMemoryAccountStore, InMemorySessionStore, SessionStore,
    SqliteStore,
};
pub use tokens::{TokenIssuer, TokenPair};

/// bcrypt cost factor for stored password hashes
pub const BCRYPT_COST: u32 = 12;
