use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::Config, error::DispatchError};

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub message_id: String,
}

/// Outbound text-message channel.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, DispatchError>;
}

/// Build the configured channel. Without complete Twilio credentials every send fails
/// with [`DispatchError::NotConfigured`].
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn SmsSender>> {
    match TwilioSms::new(config)? {
        Some(twilio) => {
            tracing::info!("Twilio SMS channel configured");
            Ok(Arc::new(twilio))
        }
        None => {
            tracing::info!("Twilio not configured, caregiver SMS disabled");
            Ok(Arc::new(DisabledSms))
        }
    }
}

pub struct TwilioSms {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

#[derive(Deserialize)]
struct TwilioMessage {
    sid: String,
}

impl TwilioSms {
    /// Returns None if any credential is missing.
    pub fn new(config: &Config) -> anyhow::Result<Option<Self>> {
        let (Some(account_sid), Some(auth_token), Some(from)) = (
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_from_number.clone(),
        ) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.io_timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            api_base: config.twilio_api_base.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
            from,
        }))
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| DispatchError::Channel(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DispatchError::Channel(format!("Twilio error {status}: {text}")));
        }

        let message: TwilioMessage = response
            .json()
            .await
            .map_err(|e| DispatchError::Channel(format!("unreadable Twilio response: {e}")))?;

        Ok(SmsReceipt {
            message_id: message.sid,
        })
    }
}

/// Channel used when no provider is configured.
pub struct DisabledSms;

#[async_trait]
impl SmsSender for DisabledSms {
    async fn send(&self, _to: &str, _body: &str) -> Result<SmsReceipt, DispatchError> {
        Err(DispatchError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| {
            if key == "DATABASE_URL" {
                return Some("postgres://localhost/saathi".into());
            }
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn partial_credentials_leave_twilio_disabled() {
        let cfg = config(&[("TWILIO_ACCOUNT_SID", "AC123"), ("TWILIO_AUTH_TOKEN", "secret")]);
        assert!(TwilioSms::new(&cfg).unwrap().is_none());
    }

    #[test]
    fn messages_url_targets_the_account() {
        let cfg = config(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_FROM_NUMBER", "+15005550006"),
            ("TWILIO_API_BASE", "http://localhost:9999/"),
        ]);
        let twilio = TwilioSms::new(&cfg).unwrap().unwrap();
        assert_eq!(
            twilio.messages_url(),
            "http://localhost:9999/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[tokio::test]
    async fn disabled_channel_reports_not_configured() {
        let err = DisabledSms.send("+15550001111", "hi").await.unwrap_err();
        assert!(matches!(err, DispatchError::NotConfigured));
    }
}
