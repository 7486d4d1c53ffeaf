//! Target-model records produced from, or written to, ISOXML tasks.

use serde::Serialize;
use time::OffsetDateTime;

/// A time span during which data was logged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimeScope {
    #[serde(with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub stop: Option<OffsetDateTime>,
    /// Seconds.
    pub duration: Option<i64>,
}

/// One product-homogeneous stream of logged data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OperationData {
    pub id: i32,
    pub prescription_id: Option<i32>,
    /// Products governing the logged device elements.
    pub product_ids: Vec<i32>,
    pub device_element_ids: Vec<i32>,
    /// Name of the time log the data came from, e.g. `TLG00001`.
    pub time_log: Option<String>,
}

/// The logged work of one task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LoggedData {
    pub id: i32,
    pub description: Option<String>,
    pub grower_id: Option<i32>,
    pub farm_id: Option<i32>,
    pub field_id: Option<i32>,
    pub time_scopes: Vec<TimeScope>,
    pub operation_data: Vec<OperationData>,
}

impl LoggedData {
    /// `true` when none of the record's operation data follows a
    /// prescription. A record without operation data qualifies.
    pub fn is_as_applied_only(&self) -> bool {
        self.operation_data
            .iter()
            .all(|data| data.prescription_id.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_applied_only_rejects_any_prescription() {
        let mut logged = LoggedData::default();
        assert!(logged.is_as_applied_only());
        logged.operation_data.push(OperationData::default());
        assert!(logged.is_as_applied_only());
        logged.operation_data.push(OperationData {
            prescription_id: Some(4),
            ..OperationData::default()
        });
        assert!(!logged.is_as_applied_only());
    }
}
