use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::{error::ApiError, models::non_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Medicine {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_taken: bool,
    pub photo_url: Option<String>,
}

/// Row shape returned by `GET /api/medicines/{user_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MedicineSummary {
    pub id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub time: NaiveTime,
    pub is_taken: bool,
    pub photo_url: Option<String>,
}

impl From<Medicine> for MedicineSummary {
    fn from(m: Medicine) -> Self {
        Self {
            id: m.id,
            name: m.name,
            dosage: m.dosage,
            time: m.time,
            is_taken: m.is_taken,
            photo_url: m.photo_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicine {
    pub user_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
}

/// Text fields of the multipart medicine form, as received.
#[derive(Debug, Default, Clone)]
pub struct MedicineForm {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl MedicineForm {
    /// Record one multipart text field. Unknown field names are ignored.
    pub fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "userId" | "user_id" => &mut self.user_id,
            "name" => &mut self.name,
            "dosage" => &mut self.dosage,
            "time" => &mut self.time,
            "start_date" | "startDate" => &mut self.start_date,
            "end_date" | "endDate" => &mut self.end_date,
            _ => return,
        };
        *slot = Some(value);
    }

    pub fn validate(self) -> Result<NewMedicine, ApiError> {
        let (Some(user_id), Some(name), Some(time), Some(start_date)) = (
            non_blank(self.user_id),
            non_blank(self.name),
            non_blank(self.time),
            non_blank(self.start_date),
        ) else {
            return Err(ApiError::validation(
                "userId, name, time, and start_date are required.",
            ));
        };

        let user_id: i64 = user_id
            .parse()
            .map_err(|_| ApiError::validation("userId must be an integer."))?;
        let time = parse_time(&time)?;
        let start_date = parse_date("start_date", &start_date)?;
        let end_date = non_blank(self.end_date)
            .map(|d| parse_date("end_date", &d))
            .transpose()?;

        if let Some(end) = end_date {
            if end < start_date {
                return Err(ApiError::validation("end_date must not be before start_date."));
            }
        }

        Ok(NewMedicine {
            user_id,
            name,
            dosage: non_blank(self.dosage),
            time,
            start_date,
            end_date,
            photo_url: None,
        })
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ApiError::validation("time must be HH:MM or HH:MM:SS."))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must be YYYY-MM-DD.")))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMedicineStatusRequest {
    pub is_taken: Option<Value>,
}

impl UpdateMedicineStatusRequest {
    /// Accepts a JSON boolean, or 0/1 as older clients send.
    pub fn validate(self) -> Result<bool, ApiError> {
        match self.is_taken {
            None | Some(Value::Null) => Err(ApiError::validation("is_taken field is required.")),
            Some(Value::Bool(b)) => Ok(b),
            Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(false),
            Some(Value::Number(n)) if n.as_i64() == Some(1) => Ok(true),
            Some(_) => Err(ApiError::validation("is_taken must be a boolean.")),
        }
    }
}
