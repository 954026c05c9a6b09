pub mod caregiver;
pub mod medicine;
pub mod notification;
pub mod profile;

/// Treat missing and whitespace-only strings the same way.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
