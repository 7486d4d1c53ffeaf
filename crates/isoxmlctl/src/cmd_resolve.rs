use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::common;

#[derive(Serialize)]
struct Resolution {
    element: String,
    declared_on: Option<String>,
    products: Vec<String>,
    governed: bool,
}

pub fn run(path: &Path, task_id: &str, element_id: &str, json: bool) -> Result<()> {
    let doc = common::load_document(path)?;
    let task = common::find_task(&doc, task_id)?;
    let mut session = common::open_session(&doc);
    if !session.hierarchies().contains(element_id) {
        bail!("no device element {element_id} in document");
    }
    let allocations = session.allocations(task);
    let hierarchies = session.hierarchies();

    let declared_on = if allocations.get(element_id).is_some() {
        Some(element_id.to_string())
    } else {
        hierarchies
            .ancestors(element_id)
            .find(|node| allocations.get(node.id()).is_some())
            .map(|node| node.id().to_string())
    };
    let products: Vec<String> = allocations
        .resolve(element_id, hierarchies)
        .unwrap_or_default()
        .iter()
        .filter_map(|pan| pan.product_id_ref.clone())
        .collect();
    let resolution = Resolution {
        element: element_id.to_string(),
        governed: allocations.governs(element_id, hierarchies),
        declared_on,
        products,
    };

    if json {
        common::print_json(&resolution)?;
        return Ok(());
    }
    match &resolution.declared_on {
        Some(owner) => println!(
            "{} <- {} (declared on {owner})",
            resolution.element,
            resolution.products.join(", ")
        ),
        None => println!("{}: no governing product allocation", resolution.element),
    }
    Ok(())
}
