//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    Account, AccountId, AccountStore, AuditStore, AuthEvent, NewAccount, SessionId, SessionStatus,
    SessionStore, StoreResult, VerificationSession,
};
use crate::error::BrokerError;

/// In-memory verification session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, VerificationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, session: VerificationSession) -> StoreResult<()> {
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session);
        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<VerificationSession>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn complete(
        &self,
        session_id: &SessionId,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> StoreResult<VerificationSession> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or(BrokerError::SessionInvalidOrExpired)?;

        if session.status != SessionStatus::Parsed || session.is_expired(now) {
            return Err(BrokerError::SessionInvalidOrExpired);
        }

        let snapshot = session.clone();
        session.status = SessionStatus::Completed;
        session.account_id = Some(account_id);
        session.temp = None;
        Ok(snapshot)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory account store with its audit log
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    events: RwLock<Vec<AuthEvent>>,
    next_account_id: AtomicU64,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            next_account_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_or_create(
        &self,
        new: NewAccount,
        now: DateTime<Utc>,
    ) -> StoreResult<(Account, bool)> {
        let mut accounts = self.accounts.write().unwrap();

        if let Some(existing) = accounts
            .values_mut()
            .find(|a| a.reference_hash == new.reference_hash)
        {
            existing.password_hash = new.password_hash;
            existing.kyc_verified_at = now;
            existing.is_active = true;
            return Ok((existing.clone(), false));
        }

        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::SeqCst));
        let account = Account {
            id,
            reference_hash: new.reference_hash,
            reference_preview: new.reference_preview,
            name: new.name,
            login_key: new.login_key,
            year_of_birth: new.year_of_birth,
            year_of_birth_synthetic: new.year_of_birth_synthetic,
            gender: new.gender,
            masked_address: new.masked_address,
            password_hash: new.password_hash,
            contact_email: placeholder_email(),
            kyc_source: new.kyc_source,
            kyc_verified_at: now,
            is_active: true,
            last_login_at: None,
            created_at: now,
        };
        accounts.insert(id, account.clone());
        Ok((account, true))
    }

    fn get(&self, account_id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&account_id).cloned())
    }

    fn get_by_reference_hash(&self, reference_hash: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.reference_hash == reference_hash)
            .cloned())
    }

    fn list_active_by_login_key(&self, login_key: &str) -> StoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|a| a.is_active && a.login_key == login_key)
            .cloned()
            .collect())
    }

    fn update_password(&self, account_id: AccountId, password_hash: &str) -> StoreResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if let Some(account) = accounts.get_mut(&account_id) {
            account.password_hash = password_hash.to_string();
            Ok(())
        } else {
            Err(BrokerError::AccountNotFound)
        }
    }

    fn touch_login(&self, account_id: AccountId, now: DateTime<Utc>) -> StoreResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if let Some(account) = accounts.get_mut(&account_id) {
            account.last_login_at = Some(now);
            Ok(())
        } else {
            Err(BrokerError::AccountNotFound)
        }
    }
}

impl AuditStore for InMemoryAccountStore {
    fn record(&self, event: AuthEvent) -> StoreResult<()> {
        self.events.write().unwrap().push(event);
        Ok(())
    }

    fn list_for_account(
        &self,
        account_id: AccountId,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<AuthEvent>> {
        let events = self.events.read().unwrap();
        let mut matching: Vec<AuthEvent> = events
            .iter()
            .filter(|e| e.account_id == Some(account_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut events = self.events.write().unwrap();
        let before = events.len();
        events.retain(|e| e.created_at >= cutoff);
        Ok((before - events.len()) as u64)
    }
}

fn placeholder_email() -> String {
    format!("kyc_{}@placeholder.local", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AuthAction;

    fn sample_new_account(reference_hash: &str) -> NewAccount {
        NewAccount {
            reference_hash: reference_hash.to_string(),
            reference_preview: "********9012".to_string(),
            name: "Rohit Kumar".to_string(),
            login_key: "ROHI".to_string(),
            year_of_birth: 1995,
            year_of_birth_synthetic: false,
            gender: "M".to_string(),
            masked_address: "***, Chennai, 600001".to_string(),
            password_hash: "hash-a".to_string(),
            kyc_source: "qr".to_string(),
        }
    }

    fn sample_session(id: &SessionId, expires_at: DateTime<Utc>) -> VerificationSession {
        VerificationSession {
            id: id.clone(),
            source: "qr".to_string(),
            status: SessionStatus::Parsed,
            temp: None,
            reference_hash: Some("abc".to_string()),
            reference_preview: Some("********9012".to_string()),
            account_id: None,
            client_ip: "127.0.0.1".to_string(),
            user_agent: None,
            error_message: None,
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn test_find_or_create_reuses_by_reference_hash() {
        let store = InMemoryAccountStore::new();
        let now = Utc::now();

        let (first, created) = store.find_or_create(sample_new_account("h1"), now).unwrap();
        assert!(created);

        let mut again = sample_new_account("h1");
        again.password_hash = "hash-b".to_string();
        let (second, created) = store.find_or_create(again, now).unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.password_hash, "hash-b");

        let (third, created) = store.find_or_create(sample_new_account("h2"), now).unwrap();
        assert!(created);
        assert_ne!(third.id, first.id);
    }

    #[test]
    fn test_complete_clears_temp_and_rejects_second_attempt() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        let mut session = sample_session(&id, Utc::now() + chrono::Duration::hours(2));
        session.temp = Some(crate::store::SessionTemp {
            name: "Rohit Kumar".to_string(),
            date_of_birth: Some("15/08/1995".to_string()),
            gender: "M".to_string(),
            year_of_birth: 1995,
            synthetic_year: false,
            masked_address: String::new(),
            login_key: "ROHI".to_string(),
            password: "ROHI150895".to_string(),
            password_hint: "ROHI******".to_string(),
        });
        store.create(session).unwrap();

        let completed = store.complete(&id, AccountId(1), Utc::now()).unwrap();
        assert!(completed.temp.is_some());

        let stored = store.get(&id).unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(stored.temp.is_none());
        assert_eq!(stored.account_id, Some(AccountId(1)));

        let again = store.complete(&id, AccountId(1), Utc::now());
        assert!(matches!(again, Err(BrokerError::SessionInvalidOrExpired)));
    }

    #[test]
    fn test_complete_rejects_expired_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        let session = sample_session(&id, Utc::now() - chrono::Duration::minutes(1));
        store.create(session).unwrap();

        let result = store.complete(&id, AccountId(1), Utc::now());
        assert!(matches!(result, Err(BrokerError::SessionInvalidOrExpired)));
    }

    #[test]
    fn test_delete_expired_keeps_live_sessions() {
        let store = InMemorySessionStore::new();
        let live = SessionId::generate();
        let dead = SessionId::generate();
        store
            .create(sample_session(&live, Utc::now() + chrono::Duration::hours(1)))
            .unwrap();
        store
            .create(sample_session(&dead, Utc::now() - chrono::Duration::hours(1)))
            .unwrap();

        let removed = store.delete_expired(Utc::now()).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&live).unwrap().is_some());
        assert!(store.get(&dead).unwrap().is_none());
    }

    #[test]
    fn test_audit_log_order_and_pruning() {
        let store = InMemoryAccountStore::new();
        let now = Utc::now();

        for i in 0..3 {
            store
                .record(AuthEvent {
                    account_id: Some(AccountId(1)),
                    login_key: "ROHI".to_string(),
                    action: AuthAction::LoginSuccess,
                    success: true,
                    failure_reason: None,
                    ip: "127.0.0.1".to_string(),
                    user_agent: None,
                    created_at: now - chrono::Duration::days(i),
                })
                .unwrap();
        }

        let events = store.list_for_account(AccountId(1), 2, 0).unwrap();
        assert_eq!(events.len(), 2);

        let removed = store
            .prune_older_than(now - chrono::Duration::days(1))
            .unwrap();
        assert_eq!(removed, 1);
    }
}
