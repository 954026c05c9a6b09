#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use saathi_api::{
    config::Config,
    db::StoreHealth,
    error::DispatchError,
    models::{
        caregiver::{Caregiver, CaregiverPatch, CaregiverSummary, NewCaregiver},
        medicine::{Medicine, MedicineSummary, NewMedicine},
        notification::MissedDose,
        profile::{NewProfile, Profile, ProfileName},
    },
    routes,
    services::{
        caregivers::CaregiverStore,
        medicines::{is_overdue, overdue_cutoff, MedicineStore},
        notifications::NotificationService,
        profiles::ProfileStore,
        sms::{SmsReceipt, SmsSender},
    },
    AppState,
};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    medicines: Vec<Medicine>,
    caregivers: Vec<Caregiver>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for Postgres. Ids are assigned per store, starting at 1.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryStore {
    fn enter(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Tables>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("connection to server at \"db\" failed");
        }
        Ok(self.tables.lock().unwrap())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn medicine_count(&self) -> usize {
        self.tables.lock().unwrap().medicines.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create(&self, profile: &NewProfile) -> anyhow::Result<Profile> {
        let mut t = self.enter()?;
        let row = Profile {
            id: t.next_id(),
            name: profile.name.clone(),
            age: profile.age,
            created_at: Utc::now(),
        };
        t.profiles.push(row.clone());
        Ok(row)
    }

    async fn find_name(&self, id: i64) -> anyhow::Result<Option<ProfileName>> {
        let t = self.enter()?;
        Ok(t.profiles
            .iter()
            .find(|p| p.id == id)
            .map(|p| ProfileName { name: p.name.clone() }))
    }
}

#[async_trait]
impl MedicineStore for MemoryStore {
    async fn create(&self, medicine: &NewMedicine) -> anyhow::Result<Medicine> {
        let mut t = self.enter()?;
        let row = Medicine {
            id: t.next_id(),
            user_id: medicine.user_id,
            name: medicine.name.clone(),
            dosage: medicine.dosage.clone(),
            time: medicine.time,
            start_date: medicine.start_date,
            end_date: medicine.end_date,
            is_taken: false,
            photo_url: medicine.photo_url.clone(),
        };
        t.medicines.push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<MedicineSummary>> {
        let t = self.enter()?;
        Ok(t.medicines
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .map(MedicineSummary::from)
            .collect())
    }

    async fn set_taken(&self, id: i64, is_taken: bool) -> anyhow::Result<bool> {
        let mut t = self.enter()?;
        match t.medicines.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.is_taken = is_taken;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_overdue_unacknowledged(
        &self,
        as_of: NaiveDateTime,
        lookback: Duration,
    ) -> anyhow::Result<Vec<MissedDose>> {
        let t = self.enter()?;
        let cutoff = overdue_cutoff(as_of, lookback);
        Ok(t.medicines
            .iter()
            .filter(|m| is_overdue(m, cutoff))
            .map(|m| MissedDose {
                user_id: m.user_id,
                name: m.name.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl CaregiverStore for MemoryStore {
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<CaregiverSummary>> {
        let t = self.enter()?;
        Ok(t.caregivers
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .map(CaregiverSummary::from)
            .collect())
    }

    async fn create(&self, caregiver: &NewCaregiver) -> anyhow::Result<Caregiver> {
        let mut t = self.enter()?;
        let row = Caregiver {
            id: t.next_id(),
            user_id: caregiver.user_id,
            name: caregiver.name.clone(),
            phone_number: caregiver.phone_number.clone(),
            relationship: caregiver.relationship.clone(),
            is_primary: caregiver.is_primary,
        };
        t.caregivers.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, patch: &CaregiverPatch) -> anyhow::Result<bool> {
        let mut t = self.enter()?;
        let Some(c) = t.caregivers.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            c.name = name.clone();
        }
        if let Some(phone) = &patch.phone_number {
            c.phone_number = phone.clone();
        }
        if let Some(relationship) = &patch.relationship {
            c.relationship = Some(relationship.clone());
        }
        if let Some(is_primary) = patch.is_primary {
            c.is_primary = is_primary;
        }
        Ok(true)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.enter()?;
        let before = t.caregivers.len();
        t.caregivers.retain(|c| c.id != id);
        Ok(t.caregivers.len() < before)
    }

    async fn find_primary_phone(&self, user_id: i64) -> anyhow::Result<Option<String>> {
        let t = self.enter()?;
        Ok(t.caregivers
            .iter()
            .filter(|c| c.user_id == user_id && c.is_primary && !c.phone_number.trim().is_empty())
            .min_by_key(|c| c.id)
            .map(|c| c.phone_number.clone()))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        self.enter().map(|_| ())
    }
}

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingSms {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Channel("Twilio error 503".into()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(SmsReceipt {
            message_id: format!("SM{:032}", sent.len()),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub sms: Arc<RecordingSms>,
    pub notifications: Arc<NotificationService>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let upload_path = upload_dir.path().to_string_lossy().to_string();
        let config = Config::from_lookup(move |key| match key {
            "DATABASE_URL" => Some("postgres://unused/saathi".into()),
            "UPLOAD_DIR" => Some(upload_path.clone()),
            _ => None,
        })
        .unwrap();

        let store = Arc::new(MemoryStore::default());
        let sms = Arc::new(RecordingSms::default());
        let notifications = Arc::new(NotificationService::new(store.clone(), sms.clone()));

        let state = AppState {
            profiles: store.clone(),
            medicines: store.clone(),
            caregivers: store.clone(),
            health: store.clone(),
            notifications: notifications.clone(),
            config: Arc::new(config),
        };

        Self {
            router: routes::router(state),
            store,
            sms,
            notifications,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        photo: Option<&[u8]>,
    ) -> (StatusCode, Value) {
        const BOUNDARY: &str = "saathi-test-boundary";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = photo {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"pill.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";
