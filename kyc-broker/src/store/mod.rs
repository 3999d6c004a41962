//! Storage abstractions for the broker

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryAccountStore, InMemorySessionStore};
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::BrokerError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, BrokerError>;

/// Trait for verification session storage
pub trait SessionStore: Send + Sync {
    /// Persist a new session
    fn create(&self, session: VerificationSession) -> StoreResult<()>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<VerificationSession>>;

    /// Atomically flip PARSED -> COMPLETED for an unexpired session,
    /// binding it to an account. Returns the session as it was at
    /// completion (temp data intact); the stored copy has its temp
    /// data cleared. Any other state fails with
    /// `SessionInvalidOrExpired`.
    fn complete(
        &self,
        session_id: &SessionId,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> StoreResult<VerificationSession>;

    /// Delete sessions past their expiry. Idempotent; returns the
    /// number removed.
    fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// Trait for account storage
pub trait AccountStore: Send + Sync {
    /// Atomically find an account by reference hash or create one.
    /// An existing account gets its password hash refreshed,
    /// `kyc_verified_at` bumped and is reactivated. Returns the
    /// account and whether it was newly created.
    fn find_or_create(&self, new: NewAccount, now: DateTime<Utc>)
        -> StoreResult<(Account, bool)>;

    /// Get an account by ID
    fn get(&self, account_id: AccountId) -> StoreResult<Option<Account>>;

    /// Get an account by its reference hash
    fn get_by_reference_hash(&self, reference_hash: &str) -> StoreResult<Option<Account>>;

    /// Active accounts sharing a login key (4-letter keys collide)
    fn list_active_by_login_key(&self, login_key: &str) -> StoreResult<Vec<Account>>;

    /// Replace an account's password hash
    fn update_password(&self, account_id: AccountId, password_hash: &str) -> StoreResult<()>;

    /// Record a successful login time
    fn touch_login(&self, account_id: AccountId, now: DateTime<Utc>) -> StoreResult<()>;
}

/// Trait for the append-only auth event log
pub trait AuditStore: Send + Sync {
    /// Append an event
    fn record(&self, event: AuthEvent) -> StoreResult<()>;

    /// Most recent events for an account, newest first
    fn list_for_account(
        &self,
        account_id: AccountId,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<AuthEvent>>;

    /// Delete events older than the cutoff; returns the number removed
    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
