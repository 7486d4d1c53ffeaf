use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Serialize)]
struct SplitReport<'a> {
    task: &'a str,
    device: &'a str,
    partitions: &'a [Vec<String>],
    diagnostics: &'a [isoxml::adm::Diagnostic],
}

pub fn run(
    path: &Path,
    task_id: &str,
    device_id: &str,
    elements: Option<&str>,
    json: bool,
) -> Result<()> {
    let doc = common::load_document(path)?;
    let mut session = common::open_session(&doc);
    let before = session.diagnostics().len();
    let logged: Vec<String> = match elements {
        Some(list) => common::parse_id_list(list),
        None => session
            .hierarchies()
            .hierarchy(device_id)
            .map(|hierarchy| hierarchy.ids().map(str::to_string).collect())
            .unwrap_or_default(),
    };
    let partitions = session
        .split(&doc, task_id, device_id, &logged)
        .with_context(|| format!("split {device_id} in {task_id}"))?;
    info!(partitions = partitions.len(), "split logged elements");

    let diagnostics = &session.diagnostics().entries()[before..];
    if json {
        return common::print_json(&SplitReport {
            task: task_id,
            device: device_id,
            partitions: &partitions,
            diagnostics,
        });
    }
    for (index, partition) in partitions.iter().enumerate() {
        println!("{:<4} {}", index, partition.join(" "));
    }
    for diagnostic in diagnostics {
        println!("{diagnostic}");
    }
    Ok(())
}
