use async_trait::async_trait;

use crate::{
    db::PgStore,
    models::profile::{NewProfile, Profile, ProfileName},
};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create(&self, profile: &NewProfile) -> anyhow::Result<Profile>;

    async fn find_name(&self, id: i64) -> anyhow::Result<Option<ProfileName>>;
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn create(&self, profile: &NewProfile) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (name, age)
             VALUES ($1, $2)
             RETURNING id, name, age, created_at",
        )
        .bind(&profile.name)
        .bind(profile.age)
        .fetch_one(self.pool())
        .await?;
        Ok(profile)
    }

    async fn find_name(&self, id: i64) -> anyhow::Result<Option<ProfileName>> {
        let name = sqlx::query_as::<_, ProfileName>("SELECT name FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(name)
    }
}
