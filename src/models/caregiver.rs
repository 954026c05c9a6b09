use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::ApiError, models::non_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Caregiver {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone_number: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
}

/// Row shape returned by `GET /api/caregivers/{user_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaregiverSummary {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
}

impl From<Caregiver> for CaregiverSummary {
    fn from(c: Caregiver) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone_number: c.phone_number,
            relationship: c.relationship,
            is_primary: c.is_primary,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaregiverRequest {
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub relationship: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCaregiver {
    pub user_id: i64,
    pub name: String,
    pub phone_number: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
}

impl CreateCaregiverRequest {
    pub fn validate(self) -> Result<NewCaregiver, ApiError> {
        match (self.user_id, non_blank(self.name), non_blank(self.phone_number)) {
            (Some(user_id), Some(name), Some(phone_number)) => Ok(NewCaregiver {
                user_id,
                name,
                phone_number,
                relationship: non_blank(self.relationship),
                is_primary: self.is_primary.unwrap_or(false),
            }),
            _ => Err(ApiError::validation(
                "userId, name, and phoneNumber are required.",
            )),
        }
    }
}

/// Partial update of a caregiver. Absent fields keep their stored value.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverPatch {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub relationship: Option<String>,
    pub is_primary: Option<bool>,
}

impl CaregiverPatch {
    /// Blank name and phone number are dropped; they can never be cleared.
    pub fn validate(self) -> Result<Self, ApiError> {
        let patch = Self {
            name: non_blank(self.name),
            phone_number: non_blank(self.phone_number),
            relationship: self.relationship.map(|r| r.trim().to_string()),
            is_primary: self.is_primary,
        };
        if patch.is_empty() {
            return Err(ApiError::validation(
                "At least one field (name, phoneNumber, relationship, or isPrimary) is required for update.",
            ));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.relationship.is_none()
            && self.is_primary.is_none()
    }
}
