//! Target model to ISOXML tasks.

use std::collections::HashSet;
use std::path::Path;

use isoxml_core::{Catalog, LoggedData, OperationData, TimeScope};
use isoxml_model::{Task, TaskStatus, Time, TimeLog, TimeType};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Assigned ISOXML ids and the source ids they were produced from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRegistry {
    entries: Vec<(String, i32)>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iso_id: impl Into<String>, source_id: i32) {
        self.entries.push((iso_id.into(), source_id));
    }

    pub fn get(&self, iso_id: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(known, _)| known == iso_id)
            .map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(iso_id, id)| (iso_id.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logged data eligible for export. Without `include_if_prescription` only
/// records whose operation data follow no prescription are kept.
pub fn exportable_logged_data(
    logged: &[LoggedData],
    include_if_prescription: bool,
) -> Vec<&LoggedData> {
    logged
        .iter()
        .filter(|record| include_if_prescription || record.is_as_applied_only())
        .collect()
}

/// Builds `TIM` elements from time scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeMapper;

impl TimeMapper {
    pub fn map(&self, scopes: &[TimeScope]) -> Vec<Time> {
        scopes
            .iter()
            .map(|scope| Time {
                start: scope.start.and_then(format_timestamp),
                stop: scope.stop.and_then(format_timestamp),
                duration: scope.duration,
                time_type: Some(TimeType::Effective),
                positions: Vec::new(),
            })
            .collect()
    }
}

/// Produces `TLG` references for the operation data of a task.
pub trait TimeLogMapper {
    fn map(
        &self,
        operation_data: &[OperationData],
        task_data_path: &Path,
        registry: &mut IdRegistry,
    ) -> Vec<TimeLog>;
}

/// Names one binary time log per operation, `TLG00001` upwards, skipping
/// names already registered or present as files under the task data path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryTimeLogMapper;

impl BinaryTimeLogMapper {
    const MAX_INDEX: u32 = 99_999;

    fn next_name(&self, start: &mut u32, task_data_path: &Path, taken: &HashSet<String>) -> Option<String> {
        while *start <= Self::MAX_INDEX {
            let name = format!("TLG{:05}", *start);
            *start += 1;
            let on_disk = ["xml", "bin"]
                .iter()
                .any(|ext| task_data_path.join(format!("{name}.{ext}")).exists());
            if !on_disk && !taken.contains(&name) {
                return Some(name);
            }
        }
        None
    }
}

impl TimeLogMapper for BinaryTimeLogMapper {
    fn map(
        &self,
        operation_data: &[OperationData],
        task_data_path: &Path,
        registry: &mut IdRegistry,
    ) -> Vec<TimeLog> {
        let mut taken: HashSet<String> = registry
            .iter()
            .map(|(iso_id, _)| iso_id.to_string())
            .filter(|iso_id| iso_id.starts_with("TLG"))
            .collect();
        let mut index = 1;
        let mut logs = Vec::with_capacity(operation_data.len());
        for operation in operation_data {
            let Some(name) = self.next_name(&mut index, task_data_path, &taken) else {
                debug!(operation = operation.id, "time log names exhausted");
                break;
            };
            registry.insert(name.clone(), operation.id);
            taken.insert(name.clone());
            logs.push(TimeLog::binary(&name));
        }
        logs
    }
}

/// Writes logged data as completed tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskMapper<L = BinaryTimeLogMapper> {
    time_mapper: TimeMapper,
    time_log_mapper: L,
}

impl TaskMapper<BinaryTimeLogMapper> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: TimeLogMapper> TaskMapper<L> {
    pub fn with_time_log_mapper(time_log_mapper: L) -> Self {
        Self {
            time_mapper: TimeMapper,
            time_log_mapper,
        }
    }

    /// One `TSK` per eligible record, numbered after `existing_tasks`. Each
    /// assigned task id is registered against the record's id.
    pub fn map(
        &self,
        logged: &[LoggedData],
        catalog: &Catalog,
        task_data_path: &Path,
        existing_tasks: usize,
        registry: &mut IdRegistry,
        include_if_prescription: bool,
    ) -> Vec<Task> {
        let records = exportable_logged_data(logged, include_if_prescription);
        let tasks: Vec<Task> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                self.map_one(record, catalog, task_data_path, existing_tasks + i + 1, registry)
            })
            .collect();
        info!(
            offered = logged.len(),
            written = tasks.len(),
            "mapped logged data to tasks"
        );
        tasks
    }

    fn map_one(
        &self,
        logged: &LoggedData,
        catalog: &Catalog,
        task_data_path: &Path,
        number: usize,
        registry: &mut IdRegistry,
    ) -> Task {
        let task_id = format!("TSK{number}");
        registry.insert(task_id.clone(), logged.id);
        debug!(task = %task_id, source = logged.id, "mapping task");

        Task {
            task_id: Some(task_id),
            designator: logged.description.clone(),
            customer_id_ref: logged
                .grower_id
                .and_then(|id| catalog.grower(id))
                .and_then(|grower| grower.id.iso_id.clone()),
            farm_id_ref: logged
                .farm_id
                .and_then(|id| catalog.farm(id))
                .and_then(|farm| farm.id.iso_id.clone()),
            partfield_id_ref: logged
                .field_id
                .and_then(|id| catalog.field(id))
                .and_then(|field| field.id.iso_id.clone()),
            status: Some(TaskStatus::Completed),
            times: self.time_mapper.map(&logged.time_scopes),
            time_logs: self
                .time_log_mapper
                .map(&logged.operation_data, task_data_path, registry),
            ..Task::default()
        }
    }
}

fn format_timestamp(value: OffsetDateTime) -> Option<String> {
    match value.format(&Rfc3339) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(error = %err, "unformattable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoxml_core::{CompoundId, Field, Grower};
    use time::macros::datetime;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.growers.insert(Grower {
            id: CompoundId::with_iso_id(7, "CTR3"),
            name: "Anna Miller".into(),
        });
        catalog.fields.insert(Field {
            id: CompoundId::new(9),
            description: "North".into(),
            grower_id: Some(7),
            farm_id: None,
            area: None,
        });
        catalog
    }

    fn record(id: i32, prescription_id: Option<i32>) -> LoggedData {
        LoggedData {
            id,
            description: Some(format!("record {id}")),
            grower_id: Some(7),
            field_id: Some(9),
            farm_id: Some(404),
            time_scopes: vec![TimeScope {
                start: Some(datetime!(2024-05-01 08:00 UTC)),
                stop: None,
                duration: Some(3600),
            }],
            operation_data: vec![OperationData {
                id: id * 10,
                prescription_id,
                ..OperationData::default()
            }],
        }
    }

    #[test]
    fn tasks_numbered_after_existing_and_registered() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IdRegistry::new();
        let tasks = TaskMapper::new().map(
            &[record(1, None), record(2, None)],
            &catalog(),
            dir.path(),
            3,
            &mut registry,
            true,
        );
        let ids: Vec<&str> = tasks.iter().filter_map(|t| t.task_id.as_deref()).collect();
        assert_eq!(ids, ["TSK4", "TSK5"]);
        assert_eq!(registry.get("TSK4"), Some(1));
        assert_eq!(registry.get("TSK5"), Some(2));

        let task = &tasks[0];
        assert_eq!(task.status, Some(TaskStatus::Completed));
        assert_eq!(task.customer_id_ref.as_deref(), Some("CTR3"));
        assert_eq!(task.farm_id_ref, None);
        assert_eq!(task.partfield_id_ref, None);
        assert_eq!(task.times[0].start.as_deref(), Some("2024-05-01T08:00:00Z"));
        assert_eq!(task.times[0].duration, Some(3600));
    }

    #[test]
    fn prescriptions_filtered_on_request() {
        let empty = LoggedData {
            id: 3,
            ..LoggedData::default()
        };
        let logged = [record(1, Some(5)), record(2, None), empty];
        assert_eq!(exportable_logged_data(&logged, true).len(), 3);
        let kept: Vec<i32> = exportable_logged_data(&logged, false)
            .iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(kept, [2, 3]);
    }

    #[test]
    fn record_without_operations_still_becomes_a_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IdRegistry::new();
        let empty = LoggedData {
            id: 8,
            ..LoggedData::default()
        };
        let tasks = TaskMapper::new().map(&[empty], &catalog(), dir.path(), 0, &mut registry, false);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id.as_deref(), Some("TSK1"));
        assert!(tasks[0].time_logs.is_empty());
        assert_eq!(registry.get("TSK1"), Some(8));
    }

    #[test]
    fn time_log_names_skip_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("TLG00001.bin"), b"").unwrap();
        let mut registry = IdRegistry::new();
        registry.insert("TLG00002", 1);
        let operations = [
            OperationData {
                id: 11,
                ..OperationData::default()
            },
            OperationData {
                id: 12,
                ..OperationData::default()
            },
        ];
        let logs = BinaryTimeLogMapper.map(&operations, dir.path(), &mut registry);
        let names: Vec<&str> = logs.iter().filter_map(|l| l.filename.as_deref()).collect();
        assert_eq!(names, ["TLG00003", "TLG00004"]);
        assert_eq!(registry.get("TLG00004"), Some(12));
    }
}
