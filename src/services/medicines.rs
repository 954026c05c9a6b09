use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};

use crate::{
    db::PgStore,
    models::{
        medicine::{Medicine, MedicineSummary, NewMedicine},
        notification::MissedDose,
    },
};

#[async_trait]
pub trait MedicineStore: Send + Sync {
    async fn create(&self, medicine: &NewMedicine) -> anyhow::Result<Medicine>;

    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<MedicineSummary>>;

    /// Returns `false` when no medicine has this id.
    async fn set_taken(&self, id: i64, is_taken: bool) -> anyhow::Result<bool>;

    /// Untaken medicines whose daily time has passed the cutoff `as_of - lookback`.
    /// See [`is_overdue`] for the exact rule.
    async fn find_overdue_unacknowledged(
        &self,
        as_of: NaiveDateTime,
        lookback: Duration,
    ) -> anyhow::Result<Vec<MissedDose>>;
}

/// The instant doses are compared against.
pub fn overdue_cutoff(as_of: NaiveDateTime, lookback: Duration) -> NaiveDateTime {
    as_of - lookback
}

/// A dose is overdue when it is untaken, started on or before the cutoff date, and its
/// time of day is at or before the cutoff time. Only the time of day is compared, so a
/// medicine recurs daily; `end_date` is not consulted.
pub fn is_overdue(medicine: &Medicine, cutoff: NaiveDateTime) -> bool {
    !medicine.is_taken && medicine.start_date <= cutoff.date() && medicine.time <= cutoff.time()
}

#[async_trait]
impl MedicineStore for PgStore {
    async fn create(&self, medicine: &NewMedicine) -> anyhow::Result<Medicine> {
        let medicine = sqlx::query_as::<_, Medicine>(
            "INSERT INTO medicines (user_id, name, dosage, time, start_date, end_date, photo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, user_id, name, dosage, time, start_date, end_date, is_taken, photo_url",
        )
        .bind(medicine.user_id)
        .bind(&medicine.name)
        .bind(&medicine.dosage)
        .bind(medicine.time)
        .bind(medicine.start_date)
        .bind(medicine.end_date)
        .bind(&medicine.photo_url)
        .fetch_one(self.pool())
        .await?;
        Ok(medicine)
    }

    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<MedicineSummary>> {
        let medicines = sqlx::query_as::<_, MedicineSummary>(
            "SELECT id, name, dosage, time, is_taken, photo_url
             FROM medicines
             WHERE user_id = $1
             ORDER BY time, id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(medicines)
    }

    async fn set_taken(&self, id: i64, is_taken: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE medicines SET is_taken = $1 WHERE id = $2")
            .bind(is_taken)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_overdue_unacknowledged(
        &self,
        as_of: NaiveDateTime,
        lookback: Duration,
    ) -> anyhow::Result<Vec<MissedDose>> {
        let cutoff = overdue_cutoff(as_of, lookback);
        let doses = sqlx::query_as::<_, MissedDose>(
            "SELECT user_id, name
             FROM medicines
             WHERE is_taken = FALSE AND start_date <= $1 AND time <= $2
             ORDER BY id",
        )
        .bind(cutoff.date())
        .bind(cutoff.time())
        .fetch_all(self.pool())
        .await?;
        Ok(doses)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn metformin(time: (u32, u32), start: (i32, u32, u32), is_taken: bool) -> Medicine {
        Medicine {
            id: 1,
            user_id: 1,
            name: "Metformin".into(),
            dosage: None,
            time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: None,
            is_taken,
            photo_url: None,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn dose_past_cutoff_is_overdue() {
        let cutoff = overdue_cutoff(at(2024, 6, 1, 8, 45), Duration::minutes(30));
        assert_eq!(cutoff.time(), NaiveTime::from_hms_opt(8, 15, 0).unwrap());
        assert!(is_overdue(&metformin((8, 0), (2024, 1, 1), false), cutoff));
    }

    #[test]
    fn dose_inside_lookback_is_not_overdue_yet() {
        let cutoff = overdue_cutoff(at(2024, 6, 1, 8, 20), Duration::minutes(30));
        assert!(!is_overdue(&metformin((8, 0), (2024, 1, 1), false), cutoff));
    }

    #[test]
    fn taken_dose_is_never_overdue() {
        let cutoff = overdue_cutoff(at(2024, 6, 1, 8, 45), Duration::minutes(30));
        assert!(!is_overdue(&metformin((8, 0), (2024, 1, 1), true), cutoff));
    }

    #[test]
    fn medicine_starting_tomorrow_is_not_overdue() {
        let cutoff = overdue_cutoff(at(2024, 6, 1, 8, 45), Duration::minutes(30));
        assert!(!is_overdue(&metformin((8, 0), (2024, 6, 2), false), cutoff));
    }

    #[test]
    fn cutoff_crossing_midnight_uses_previous_day() {
        let cutoff = overdue_cutoff(at(2024, 6, 2, 0, 10), Duration::minutes(30));
        assert_eq!(cutoff.date(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        // A medicine starting on the 2nd is not yet due against a cutoff on the 1st.
        assert!(!is_overdue(&metformin((8, 0), (2024, 6, 2), false), cutoff));
        assert!(is_overdue(&metformin((23, 30), (2024, 6, 1), false), cutoff));
    }
}
