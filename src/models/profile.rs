use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::ApiError, models::non_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
}

/// Body of `GET /api/profile/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileName {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub name: String,
    pub age: i32,
}

impl CreateProfileRequest {
    pub fn validate(self) -> Result<NewProfile, ApiError> {
        let name = non_blank(self.name);
        let age = self.age.filter(|a| *a > 0);
        match (name, age) {
            (Some(name), Some(age)) => {
                let age = i32::try_from(age).map_err(|_| ApiError::validation("age is out of range."))?;
                Ok(NewProfile { name, age })
            }
            _ => Err(ApiError::validation("Name and age are required.")),
        }
    }
}
