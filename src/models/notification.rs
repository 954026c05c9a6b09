use serde::Deserialize;

use crate::{error::ApiError, models::non_blank};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyCaregiverRequest {
    pub user_id: Option<i64>,
    pub medicine_name: Option<String>,
}

impl NotifyCaregiverRequest {
    pub fn validate(self) -> Result<(i64, String), ApiError> {
        match (self.user_id, non_blank(self.medicine_name)) {
            (Some(user_id), Some(medicine_name)) => Ok((user_id, medicine_name)),
            _ => Err(ApiError::validation("userId and medicineName are required.")),
        }
    }
}

/// What the dispatcher did for one notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Message accepted by the channel; carries the provider message id.
    Sent { message_id: String },
    /// No primary caregiver with a phone number is on file.
    Skipped,
}

/// A dose the sweep considers missed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MissedDose {
    pub user_id: i64,
    pub name: String,
}
