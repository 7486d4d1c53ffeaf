use std::error::Error;

use isoxml::adm::{Catalog, CompoundId, Grower, LoggedData, OperationData, TimeScope};
use isoxml::iso::{write_document, TaskData};
use isoxml::{IdRegistry, TaskMapper};
use time::OffsetDateTime;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    let dir = tempfile::tempdir()?;

    let mut catalog = Catalog::new();
    catalog.growers.insert(Grower {
        id: CompoundId::with_iso_id(1, "CTR1"),
        name: "Demo farmer".into(),
    });
    let logged = vec![LoggedData {
        id: 1,
        description: Some("Spraying".into()),
        grower_id: Some(1),
        time_scopes: vec![TimeScope {
            start: Some(OffsetDateTime::now_utc()),
            stop: None,
            duration: None,
        }],
        operation_data: vec![OperationData {
            id: 10,
            ..OperationData::default()
        }],
        ..LoggedData::default()
    }];

    let mut registry = IdRegistry::new();
    let mut doc = TaskData::new("demo", "1.0");
    doc.tasks = TaskMapper::new().map(&logged, &catalog, dir.path(), 0, &mut registry, true);
    println!("{}", write_document(&doc)?);
    for (iso_id, source) in registry.iter() {
        println!("{iso_id} <- {source}");
    }
    Ok(())
}
