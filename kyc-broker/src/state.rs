//! Broker application state

use std::sync::Arc;

use kyc_core::{Extractor, ReferenceHasher};

use crate::config::Config;
use crate::rate_limit::RateLimits;
use crate::store::{AccountStore, AuditStore, SessionStore};
use crate::tokens::TokenIssuer;

/// Shared state handed to every route
pub struct AppState<S, A> {
    pub config: Config,
    pub extractor: Extractor,
    pub hasher: ReferenceHasher,
    pub tokens: TokenIssuer,
    pub limits: RateLimits,
    pub session_store: Arc<S>,
    pub account_store: Arc<A>,
}

impl<S, A> AppState<S, A>
where
    S: SessionStore,
    A: AccountStore + AuditStore,
{
    pub fn new(config: Config, session_store: Arc<S>, account_store: Arc<A>) -> Self {
        let hasher = ReferenceHasher::new(config.reference_salt.clone());
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        );
        let limits = RateLimits::new(config.rate_limiting);
        Self {
            config,
            extractor: Extractor::new(),
            hasher,
            tokens,
            limits,
            session_store,
            account_store,
        }
    }
}
