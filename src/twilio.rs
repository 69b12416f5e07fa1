//! SMS delivery through the Twilio Messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::notify::{Notifier, NotifyError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

pub const DEFAULT_FROM_NUMBER: &str = "+13198786247";

// Ref: https://www.twilio.com/docs/api/errors/21614
const UNREACHABLE_DESTINATION: i64 = 21614;

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TwilioNotifier {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioNotifier {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", recipient), ("From", self.from.as_str()), ("Body", message)])
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let error: Option<TwilioErrorBody> = serde_json::from_str(&body).ok();
        let code = error.as_ref().and_then(|e| e.code);

        if code == Some(UNREACHABLE_DESTINATION) {
            log::warn!("{recipient} can't receive SMS messages");
        }

        Err(NotifyError::Rejected {
            status: status.as_u16(),
            code,
            message: error.and_then(|e| e.message).unwrap_or(body),
        })
    }
}
