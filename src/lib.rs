// Library exports for the binaries and integration tests
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::db::StoreHealth;
use crate::services::{
    caregivers::CaregiverStore, medicines::MedicineStore, notifications::NotificationService,
    profiles::ProfileStore,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub medicines: Arc<dyn MedicineStore>,
    pub caregivers: Arc<dyn CaregiverStore>,
    pub health: Arc<dyn StoreHealth>,
    pub notifications: Arc<NotificationService>,
    pub config: Arc<Config>,
}
