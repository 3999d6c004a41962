//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    Account, AccountId, AccountStore, AuditStore, AuthAction, AuthEvent, NewAccount, SessionId,
    SessionStatus, SessionStore, SessionTemp, StoreResult, VerificationSession,
};
use crate::error::BrokerError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing SessionStore, AccountStore and AuditStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, BrokerError> {
        let conn = Connection::open(path).map_err(|e| BrokerError::Internal(e.to_string()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), BrokerError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, BrokerError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), BrokerError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Accounts, anchored on the hashed reference number
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reference_hash TEXT NOT NULL UNIQUE,
                reference_preview TEXT NOT NULL,
                name TEXT NOT NULL,
                login_key TEXT NOT NULL,
                year_of_birth INTEGER NOT NULL,
                year_of_birth_synthetic INTEGER NOT NULL DEFAULT 0,
                gender TEXT NOT NULL,
                masked_address TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                contact_email TEXT NOT NULL UNIQUE,
                kyc_source TEXT NOT NULL,
                kyc_verified_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                last_login_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_accounts_login_key
                ON accounts(login_key, is_active);

            -- Verification sessions; temp JSON is cleared on completion
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                status TEXT NOT NULL,
                temp TEXT,
                reference_hash TEXT,
                reference_preview TEXT,
                account_id INTEGER REFERENCES accounts(id),
                client_ip TEXT NOT NULL,
                user_agent TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

            -- Append-only auth event log
            CREATE TABLE IF NOT EXISTS auth_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER,
                login_key TEXT NOT NULL,
                action TEXT NOT NULL,
                success INTEGER NOT NULL,
                failure_reason TEXT,
                ip TEXT NOT NULL,
                user_agent TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_auth_events_created_at ON auth_events(created_at);
            CREATE INDEX IF NOT EXISTS idx_auth_events_account_id ON auth_events(account_id);
            "#,
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let id: i64 = row.get(0)?;
    let last_login_at: Option<String> = row.get(14)?;
    Ok(Account {
        id: AccountId(id as u64),
        reference_hash: row.get(1)?,
        reference_preview: row.get(2)?,
        name: row.get(3)?,
        login_key: row.get(4)?,
        year_of_birth: row.get(5)?,
        year_of_birth_synthetic: row.get::<_, i32>(6)? != 0,
        gender: row.get(7)?,
        masked_address: row.get(8)?,
        password_hash: row.get(9)?,
        contact_email: row.get(10)?,
        kyc_source: row.get(11)?,
        kyc_verified_at: parse_time(&row.get::<_, String>(12)?),
        is_active: row.get::<_, i32>(13)? != 0,
        last_login_at: last_login_at.map(|s| parse_time(&s)),
        created_at: parse_time(&row.get::<_, String>(15)?),
    })
}

const ACCOUNT_COLUMNS: &str = "id, reference_hash, reference_preview, name, login_key, \
     year_of_birth, year_of_birth_synthetic, gender, masked_address, password_hash, \
     contact_email, kyc_source, kyc_verified_at, is_active, last_login_at, created_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerificationSession> {
    let temp_json: Option<String> = row.get(3)?;
    let status: String = row.get(2)?;
    let account_id: Option<i64> = row.get(6)?;
    Ok(VerificationSession {
        id: SessionId(row.get(0)?),
        source: row.get(1)?,
        status: SessionStatus::from_str(&status).unwrap_or(SessionStatus::Rejected),
        temp: temp_json.and_then(|json| serde_json::from_str::<SessionTemp>(&json).ok()),
        reference_hash: row.get(4)?,
        reference_preview: row.get(5)?,
        account_id: account_id.map(|id| AccountId(id as u64)),
        client_ip: row.get(7)?,
        user_agent: row.get(8)?,
        error_message: row.get(9)?,
        created_at: parse_time(&row.get::<_, String>(10)?),
        expires_at: parse_time(&row.get::<_, String>(11)?),
    })
}

const SESSION_COLUMNS: &str = "id, source, status, temp, reference_hash, reference_preview, \
     account_id, client_ip, user_agent, error_message, created_at, expires_at";

impl SessionStore for SqliteStore {
    fn create(&self, session: VerificationSession) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let temp_json = session
            .temp
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        conn.execute(
            "INSERT INTO sessions (id, source, status, temp, reference_hash, reference_preview,
                                   account_id, client_ip, user_agent, error_message,
                                   created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                session.id.0,
                session.source,
                session.status.as_str(),
                temp_json,
                session.reference_hash,
                session.reference_preview,
                session.account_id.map(|id| id.0 as i64),
                session.client_ip,
                session.user_agent,
                session.error_message,
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<VerificationSession>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            params![session_id.0],
            row_to_session,
        )
        .optional()
        .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    fn complete(
        &self,
        session_id: &SessionId,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> StoreResult<VerificationSession> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        let session = tx
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![session_id.0],
                row_to_session,
            )
            .optional()
            .map_err(|e| BrokerError::Internal(e.to_string()))?
            .ok_or(BrokerError::SessionInvalidOrExpired)?;

        if session.status != SessionStatus::Parsed || session.is_expired(now) {
            return Err(BrokerError::SessionInvalidOrExpired);
        }

        tx.execute(
            "UPDATE sessions SET status = ?1, account_id = ?2, temp = NULL WHERE id = ?3",
            params![
                SessionStatus::Completed.as_str(),
                account_id.0 as i64,
                session_id.0
            ],
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        tx.commit()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(session)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![now.to_rfc3339()],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(rows_deleted as u64)
    }
}

impl AccountStore for SqliteStore {
    fn find_or_create(
        &self,
        new: NewAccount,
        now: DateTime<Utc>,
    ) -> StoreResult<(Account, bool)> {
        let conn = self.conn.lock().unwrap();
        let now_str = now.to_rfc3339();
        let contact_email = format!("kyc_{}@placeholder.local", Uuid::new_v4().simple());

        let insert = conn.execute(
            "INSERT INTO accounts (reference_hash, reference_preview, name, login_key,
                                   year_of_birth, year_of_birth_synthetic, gender,
                                   masked_address, password_hash, contact_email, kyc_source,
                                   kyc_verified_at, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13)",
            params![
                new.reference_hash,
                new.reference_preview,
                new.name,
                new.login_key,
                new.year_of_birth,
                new.year_of_birth_synthetic as i32,
                new.gender,
                new.masked_address,
                new.password_hash,
                contact_email,
                new.kyc_source,
                now_str,
                now_str,
            ],
        );

        match insert {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                let account = conn
                    .query_row(
                        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                        params![id],
                        row_to_account,
                    )
                    .map_err(|e| BrokerError::Internal(e.to_string()))?;
                Ok((account, true))
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Lost the insert race (or the account already exists):
                // refresh the existing row instead
                conn.execute(
                    "UPDATE accounts
                     SET password_hash = ?1, kyc_verified_at = ?2, is_active = 1
                     WHERE reference_hash = ?3",
                    params![new.password_hash, now_str, new.reference_hash],
                )
                .map_err(|e| BrokerError::Internal(e.to_string()))?;

                let account = conn
                    .query_row(
                        &format!(
                            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE reference_hash = ?1"
                        ),
                        params![new.reference_hash],
                        row_to_account,
                    )
                    .map_err(|e| BrokerError::Internal(e.to_string()))?;
                Ok((account, false))
            }
            Err(e) => Err(BrokerError::Internal(e.to_string())),
        }
    }

    fn get(&self, account_id: AccountId) -> StoreResult<Option<Account>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
            params![account_id.0 as i64],
            row_to_account,
        )
        .optional()
        .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    fn get_by_reference_hash(&self, reference_hash: &str) -> StoreResult<Option<Account>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE reference_hash = ?1"),
            params![reference_hash],
            row_to_account,
        )
        .optional()
        .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    fn list_active_by_login_key(&self, login_key: &str) -> StoreResult<Vec<Account>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts
                 WHERE login_key = ?1 AND is_active = 1"
            ))
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        let accounts = stmt
            .query_map(params![login_key], row_to_account)
            .map_err(|e| BrokerError::Internal(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(accounts)
    }

    fn update_password(&self, account_id: AccountId, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, account_id.0 as i64],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        if rows_affected == 0 {
            return Err(BrokerError::AccountNotFound);
        }

        Ok(())
    }

    fn touch_login(&self, account_id: AccountId, now: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                "UPDATE accounts SET last_login_at = ?1 WHERE id = ?2",
                params![now.to_rfc3339(), account_id.0 as i64],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        if rows_affected == 0 {
            return Err(BrokerError::AccountNotFound);
        }

        Ok(())
    }
}

impl AuditStore for SqliteStore {
    fn record(&self, event: AuthEvent) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO auth_events (account_id, login_key, action, success, failure_reason,
                                      ip, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.account_id.map(|id| id.0 as i64),
                event.login_key,
                event.action.as_str(),
                event.success as i32,
                event.failure_reason,
                event.ip,
                event.user_agent,
                event.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(())
    }

    fn list_for_account(
        &self,
        account_id: AccountId,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<AuthEvent>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT account_id, login_key, action, success, failure_reason, ip, user_agent,
                        created_at
                 FROM auth_events WHERE account_id = ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        let events = stmt
            .query_map(params![account_id.0 as i64, limit, offset], |row| {
                let account_id: Option<i64> = row.get(0)?;
                let action: String = row.get(2)?;
                Ok(AuthEvent {
                    account_id: account_id.map(|id| AccountId(id as u64)),
                    login_key: row.get(1)?,
                    action: AuthAction::from_str(&action).unwrap_or(AuthAction::LoginFailure),
                    success: row.get::<_, i32>(3)? != 0,
                    failure_reason: row.get(4)?,
                    ip: row.get(5)?,
                    user_agent: row.get(6)?,
                    created_at: parse_time(&row.get::<_, String>(7)?),
                })
            })
            .map_err(|e| BrokerError::Internal(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(events)
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM auth_events WHERE created_at < ?1",
                params![cutoff.to_rfc3339()],
            )
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(rows_deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    fn sample_new_account(reference_hash: &str, login_key: &str) -> NewAccount {
        NewAccount {
            reference_hash: reference_hash.to_string(),
            reference_preview: "********9012".to_string(),
            name: "Rohit Kumar".to_string(),
            login_key: login_key.to_string(),
            year_of_birth: 1995,
            year_of_birth_synthetic: false,
            gender: "M".to_string(),
            masked_address: "***, Chennai, 600001".to_string(),
            password_hash: "hash-a".to_string(),
            kyc_source: "qr".to_string(),
        }
    }

    #[test]
    fn test_find_or_create_roundtrip() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        let (account, created) = store
            .find_or_create(sample_new_account("h1", "ROHI"), now)
            .unwrap();
        assert!(created);
        assert!(account.is_active);
        assert!(account.contact_email.ends_with("@placeholder.local"));

        let fetched = AccountStore::get(&store, account.id).unwrap().unwrap();
        assert_eq!(fetched.reference_hash, "h1");
        assert_eq!(fetched.year_of_birth, 1995);
    }

    #[test]
    fn test_duplicate_reference_hash_is_absorbed() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        let (first, _) = store
            .find_or_create(sample_new_account("h1", "ROHI"), now)
            .unwrap();

        let mut again = sample_new_account("h1", "ROHI");
        again.password_hash = "hash-b".to_string();
        let (second, created) = store.find_or_create(again, now).unwrap();

        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.password_hash, "hash-b");
    }

    #[test]
    fn test_login_key_collisions_both_returned() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        store
            .find_or_create(sample_new_account("h1", "ROHI"), now)
            .unwrap();
        store
            .find_or_create(sample_new_account("h2", "ROHI"), now)
            .unwrap();

        let accounts = store.list_active_by_login_key("ROHI").unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn test_session_complete_guard() {
        let (store, _dir) = create_test_store();
        let id = SessionId::generate();
        let session = VerificationSession {
            id: id.clone(),
            source: "qr".to_string(),
            status: SessionStatus::Parsed,
            temp: Some(SessionTemp {
                name: "Rohit Kumar".to_string(),
                date_of_birth: Some("15/08/1995".to_string()),
                gender: "M".to_string(),
                year_of_birth: 1995,
                synthetic_year: false,
                masked_address: String::new(),
                login_key: "ROHI".to_string(),
                password: "ROHI150895".to_string(),
                password_hint: "ROHI******".to_string(),
            }),
            reference_hash: Some("h1".to_string()),
            reference_preview: Some("********9012".to_string()),
            account_id: None,
            client_ip: "127.0.0.1".to_string(),
            user_agent: None,
            error_message: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(2),
        };
        store.create(session).unwrap();

        let completed = store.complete(&id, AccountId(7), Utc::now()).unwrap();
        assert_eq!(completed.temp.unwrap().password, "ROHI150895");

        let stored = SessionStore::get(&store, &id).unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(stored.temp.is_none());
        assert_eq!(stored.account_id, Some(AccountId(7)));

        assert!(store.complete(&id, AccountId(7), Utc::now()).is_err());
    }

    #[test]
    fn test_delete_expired_sessions() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        for (idx, offset) in [-1i64, 1].into_iter().enumerate() {
            let session = VerificationSession {
                id: SessionId(format!("kyc_test_{idx}")),
                source: "qr".to_string(),
                status: SessionStatus::Parsed,
                temp: None,
                reference_hash: None,
                reference_preview: None,
                account_id: None,
                client_ip: "127.0.0.1".to_string(),
                user_agent: None,
                error_message: None,
                created_at: now,
                expires_at: now + chrono::Duration::hours(offset),
            };
            store.create(session).unwrap();
        }

        assert_eq!(store.delete_expired(now).unwrap(), 1);
        assert!(SessionStore::get(&store, &SessionId("kyc_test_1".to_string()))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_audit_events_roundtrip() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        store
            .record(AuthEvent {
                account_id: Some(AccountId(1)),
                login_key: "ROHI".to_string(),
                action: AuthAction::LoginFailure,
                success: false,
                failure_reason: Some("bad password".to_string()),
                ip: "10.0.0.1".to_string(),
                user_agent: Some("test-agent".to_string()),
                created_at: now,
            })
            .unwrap();

        let events = store.list_for_account(AccountId(1), 10, 0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuthAction::LoginFailure);
        assert_eq!(events[0].failure_reason.as_deref(), Some("bad password"));

        let removed = store
            .prune_older_than(now + chrono::Duration::seconds(1))
            .unwrap();
        assert_eq!(removed, 1);
    }
}
