//! Emergency medical profiles with QR-linked public pages and SMS alerts.
//!
//! A user keeps a medical profile and a list of emergency contacts. Anyone
//! holding the profile's public token (encoded in a QR code) can view the
//! profile and trigger an SMS alert to every contact.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::alerts::AlertDispatcher;
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::rate_limit::{RateLimitStore, RateLimiters};

pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod entity;
pub mod error;
pub mod phone;
pub mod profiles;
pub mod rate_limit;
pub mod sms;
pub mod validation;

/// Process-wide handles shared by every request.
#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub tokens: TokenService,
    pub limiters: RateLimiters,
}

impl AppResources {
    /// Wires the limiters to `store` and the dispatcher to Twilio per `config`.
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>, store: &RateLimitStore) -> Self {
        let dispatcher = AlertDispatcher::from_config(&config);
        Self::with_dispatcher(db, config, store, dispatcher)
    }

    pub fn with_dispatcher(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        store: &RateLimitStore,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret),
            limiters: RateLimiters::from_config(store, &config.rate_limits),
            dispatcher: Arc::new(dispatcher),
            db,
            config,
        }
    }
}
