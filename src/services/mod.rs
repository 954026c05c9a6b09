pub mod caregivers;
pub mod dose_scheduler;
pub mod medicines;
pub mod metrics;
pub mod notifications;
pub mod profiles;
pub mod sms;
pub mod uploads;
