use std::path::Path;

use anyhow::Result;
use isoxml::adm::{EntityKind, ProductForm, ProductType};
use serde::Serialize;

use crate::common;

#[derive(Serialize)]
struct ProductEntry {
    id: i32,
    iso_id: Option<String>,
    description: Option<String>,
    form: Option<ProductForm>,
    product_type: Option<ProductType>,
}

pub fn run(path: &Path, task_id: &str, json: bool) -> Result<()> {
    let doc = common::load_document(path)?;
    let task = common::find_task(&doc, task_id)?;
    let mut session = common::open_session(&doc);
    let allocations = session.allocations(task);

    let entries: Vec<ProductEntry> = allocations
        .distinct_product_ids(session.id_map())
        .into_iter()
        .map(|id| {
            let product = session.catalog().product(id);
            ProductEntry {
                id,
                iso_id: session
                    .id_map()
                    .lookup_reverse(EntityKind::Product, id)
                    .map(str::to_string),
                description: product.map(|p| p.description.clone()),
                form: product.map(|p| p.form),
                product_type: product.map(|p| p.product_type),
            }
        })
        .collect();

    if json {
        common::print_json(&entries)?;
        return Ok(());
    }
    if entries.is_empty() {
        println!("No products allocated in {task_id}.");
        return Ok(());
    }
    println!("{:<6} {:<14} {:<10} {:<10} {}", "ID", "ISO", "FORM", "TYPE", "Designator");
    for entry in &entries {
        println!(
            "{:<6} {:<14} {:<10} {:<10} {}",
            entry.id,
            entry.iso_id.as_deref().unwrap_or("-"),
            entry.form.map(|f| format!("{f:?}")).unwrap_or_default(),
            entry.product_type.map(|t| format!("{t:?}")).unwrap_or_default(),
            entry.description.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
