use crate::types::ActivityKey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InventoryError>;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Duplicate activity: {0}")]
    DuplicateActivity(ActivityKey),

    #[error("Activity {activity} has no exchange named '{exchange}'")]
    MissingExchange {
        activity: ActivityKey,
        exchange: String,
    },

    #[error("{} unresolved technosphere reference(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    DanglingReferences(Vec<ActivityKey>),
}
