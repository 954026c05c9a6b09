use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    error::DispatchError,
    models::notification::NotifyOutcome,
    services::{caregivers::CaregiverStore, metrics::NOTIFICATIONS_COUNTER, sms::SmsSender},
};

/// Text sent to the caregiver when a dose is missed.
pub fn missed_dose_message(medicine_name: &str) -> String {
    format!(
        "Reminder: Your loved one has missed their {medicine_name} dose. Please check in with them."
    )
}

/// Keep only the last four digits of a phone number for log lines.
pub(crate) fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("***{tail}")
}

/// Resolves a user's primary caregiver and texts them about a missed dose.
/// Shared by the manual notify endpoint and the missed-dose sweep.
pub struct NotificationService {
    caregivers: Arc<dyn CaregiverStore>,
    sms: Arc<dyn SmsSender>,
}

impl NotificationService {
    pub fn new(caregivers: Arc<dyn CaregiverStore>, sms: Arc<dyn SmsSender>) -> Self {
        Self { caregivers, sms }
    }

    /// A missing caregiver is not an error: the call returns [`NotifyOutcome::Skipped`].
    /// Lookup and channel failures are logged here and returned to the caller.
    pub async fn notify(
        &self,
        user_id: i64,
        medicine_name: &str,
    ) -> Result<NotifyOutcome, DispatchError> {
        let outcome = self.dispatch(user_id, medicine_name).await;
        let label = match &outcome {
            Ok(NotifyOutcome::Sent { .. }) => "sent",
            Ok(NotifyOutcome::Skipped) => "skipped",
            Err(_) => "failed",
        };
        NOTIFICATIONS_COUNTER.with_label_values(&[label]).inc();
        outcome
    }

    async fn dispatch(
        &self,
        user_id: i64,
        medicine_name: &str,
    ) -> Result<NotifyOutcome, DispatchError> {
        let phone = self
            .caregivers
            .find_primary_phone(user_id)
            .await
            .map_err(|e| {
                error!("Caregiver lookup failed for user {}: {:#}", user_id, e);
                DispatchError::Lookup(e)
            })?;

        let Some(phone) = phone else {
            warn!("No primary caregiver number found for user {}", user_id);
            return Ok(NotifyOutcome::Skipped);
        };

        let body = missed_dose_message(medicine_name);
        match self.sms.send(&phone, &body).await {
            Ok(receipt) => {
                info!(
                    "SMS sent to {} for user {}. SID: {}",
                    mask_phone(&phone),
                    user_id,
                    receipt.message_id
                );
                Ok(NotifyOutcome::Sent {
                    message_id: receipt.message_id,
                })
            }
            Err(e) => {
                error!(
                    "Failed to send SMS to {} for user {}: {}",
                    mask_phone(&phone),
                    user_id,
                    e
                );
                Err(e)
            }
        }
    }
}
