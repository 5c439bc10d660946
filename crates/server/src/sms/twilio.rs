//! Twilio Programmable Messaging over plain REST.

use super::{OutboundSms, SentMessage, SmsClient};
use crate::config::TwilioConfig;
use crate::error::SmsError;
use serde::Deserialize;
use std::time::Duration;

/// Error body Twilio returns with non-2xx responses.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("messages_url", &self.messages_url)
            .field("account_sid", &self.account_sid)
            .finish_non_exhaustive()
    }
}

impl TwilioClient {
    pub fn new(
        api_base_url: &str,
        account_sid: &str,
        auth_token: &str,
        timeout: Duration,
    ) -> Result<Self, SmsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("medguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SmsError::Network(e.to_string()))?;
        Ok(Self {
            http,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                api_base_url.trim_end_matches('/'),
                account_sid
            ),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
        })
    }

    /// Builds a client when both the account SID and auth token are present.
    pub fn from_config(config: &TwilioConfig) -> Result<Self, SmsError> {
        let account_sid = config
            .account_sid
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(SmsError::NotConfigured("twilio.account_sid"))?;
        let auth_token = config
            .auth_token
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(SmsError::NotConfigured("twilio.auth_token"))?;
        Self::new(
            &config.api_base_url,
            account_sid,
            auth_token,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl SmsClient for TwilioClient {
    #[tracing::instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: OutboundSms) -> Result<SentMessage, SmsError> {
        let form = [
            ("To", message.to.as_str()),
            ("From", message.from.as_str()),
            ("Body", message.body.as_str()),
        ];
        let response = self
            .http
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: Option<TwilioErrorBody> = serde_json::from_str(&body).ok();
            let (code, message) = match parsed {
                Some(TwilioErrorBody { code, message }) => (
                    code,
                    message.unwrap_or_else(|| format!("HTTP {status} from Twilio")),
                ),
                None => (None, format!("HTTP {status} from Twilio")),
            };
            return Err(SmsError::Vendor {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(response.json::<SentMessage>().await?)
    }
}
