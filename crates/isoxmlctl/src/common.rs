use std::path::Path;

use anyhow::{anyhow, Context, Result};
use isoxml::iso::{Task, TaskData};
use isoxml::{ConversionOptions, ConversionSession, TaskImporter};
use serde::Serialize;
use tracing::info;

/// Read and parse a task data file.
pub fn load_document(path: &Path) -> Result<TaskData> {
    let doc = isoxml::read_task_data(path)
        .with_context(|| format!("load task data from {}", path.display()))?;
    info!(
        devices = doc.devices.len(),
        tasks = doc.tasks.len(),
        "loaded {}",
        path.display()
    );
    Ok(doc)
}

/// Session with the catalog and hierarchies of `doc` in place.
pub fn open_session(doc: &TaskData) -> ConversionSession {
    open_session_with(doc, ConversionOptions::default())
}

pub fn open_session_with(doc: &TaskData, options: ConversionOptions) -> ConversionSession {
    let mut session = ConversionSession::from_document(doc, options);
    TaskImporter::new().import_catalog(doc, &mut session);
    session
}

pub fn find_task<'a>(doc: &'a TaskData, task_id: &str) -> Result<&'a Task> {
    doc.task(task_id)
        .ok_or_else(|| anyhow!("no task {task_id} in document"))
}

/// Split a comma separated id list, dropping empty entries.
pub fn parse_id_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_ignores_blanks() {
        assert_eq!(parse_id_list("DET1, DET2,,DET3 "), ["DET1", "DET2", "DET3"]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let err = load_document(Path::new("/nonexistent/TASKDATA.XML")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/TASKDATA.XML"));
    }
}
