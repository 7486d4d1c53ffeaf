use std::path::Path;

use anyhow::{bail, Context, Result};
use isoxml::iso::{parse_document, write_document};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Serialize)]
struct Summary {
    file: String,
    bytes: usize,
    identical: bool,
}

pub fn run(path: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let doc = common::load_document(path)?;
    let xml = write_document(&doc).context("serialise task data")?;
    let reread = parse_document(&xml).context("re-read serialised task data")?;
    let identical = reread == doc;
    info!(bytes = xml.len(), identical, "round trip complete");

    if let Some(output) = output {
        std::fs::write(output, &xml).with_context(|| format!("write {}", output.display()))?;
    } else if !json {
        println!("{xml}");
    }
    if json {
        common::print_json(&Summary {
            file: path.display().to_string(),
            bytes: xml.len(),
            identical,
        })?;
    }
    if !identical {
        bail!("document changed across write and re-read");
    }
    Ok(())
}
