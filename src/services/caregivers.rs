use async_trait::async_trait;

use crate::{
    db::PgStore,
    models::caregiver::{Caregiver, CaregiverPatch, CaregiverSummary, NewCaregiver},
};

#[async_trait]
pub trait CaregiverStore: Send + Sync {
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<CaregiverSummary>>;

    async fn create(&self, caregiver: &NewCaregiver) -> anyhow::Result<Caregiver>;

    /// Applies only the fields present in `patch`. Returns `false` when no caregiver has this id.
    async fn update(&self, id: i64, patch: &CaregiverPatch) -> anyhow::Result<bool>;

    /// Returns `false` when no caregiver has this id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;

    /// Phone number of the user's primary caregiver. When several caregivers are flagged
    /// primary the one with the lowest id wins; empty numbers count as absent.
    async fn find_primary_phone(&self, user_id: i64) -> anyhow::Result<Option<String>>;
}

#[async_trait]
impl CaregiverStore for PgStore {
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<CaregiverSummary>> {
        let caregivers = sqlx::query_as::<_, CaregiverSummary>(
            "SELECT id, name, phone_number, relationship, is_primary
             FROM caregivers
             WHERE user_id = $1
             ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(caregivers)
    }

    async fn create(&self, caregiver: &NewCaregiver) -> anyhow::Result<Caregiver> {
        let caregiver = sqlx::query_as::<_, Caregiver>(
            "INSERT INTO caregivers (user_id, name, phone_number, relationship, is_primary)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, name, phone_number, relationship, is_primary",
        )
        .bind(caregiver.user_id)
        .bind(&caregiver.name)
        .bind(&caregiver.phone_number)
        .bind(&caregiver.relationship)
        .bind(caregiver.is_primary)
        .fetch_one(self.pool())
        .await?;
        Ok(caregiver)
    }

    async fn update(&self, id: i64, patch: &CaregiverPatch) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE caregivers
             SET name         = COALESCE($1, name),
                 phone_number = COALESCE($2, phone_number),
                 relationship = COALESCE($3, relationship),
                 is_primary   = COALESCE($4, is_primary)
             WHERE id = $5",
        )
        .bind(&patch.name)
        .bind(&patch.phone_number)
        .bind(&patch.relationship)
        .bind(patch.is_primary)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM caregivers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_primary_phone(&self, user_id: i64) -> anyhow::Result<Option<String>> {
        let phone: Option<String> = sqlx::query_scalar(
            "SELECT phone_number
             FROM caregivers
             WHERE user_id = $1 AND is_primary = TRUE AND phone_number <> ''
             ORDER BY id
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(phone.filter(|p| !p.trim().is_empty()))
    }
}
