use std::env;
use std::error::Error;

use isoxml::iso::parse_document;
use isoxml::{ConversionOptions, ConversionSession, TaskImporter};

const SPRAYER_TASK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="demo" ManagementSoftwareVersion="1.0" DataTransferOrigin="1">
  <DVC A="DVC1" B="Combo drill" D="A00084000F000000" F="31" G="656E">
    <DET A="DET1" B="1" C="1" D="Drill" E="0" F="0"/>
    <DET A="DET2" B="2" C="3" D="Fertilizer tank" E="1" F="1"/>
    <DET A="DET3" B="3" C="3" D="Seed hopper" E="2" F="1"/>
    <DET A="DET4" B="4" C="4" E="3" F="2"/>
    <DET A="DET5" B="5" C="4" E="4" F="3"/>
  </DVC>
  <PDT A="PDT1" B="UAN 28" E="0001"/>
  <PDT A="PDT2" B="Wheat" E="000B"/>
  <TSK A="TSK1" B="Drilling" G="4">
    <PAN A="PDT1" E="DET2"/>
    <PAN A="PDT2" E="DET3"/>
    <TLG A="TLG00001" C="1"/>
  </TSK>
</ISO11783_TaskData>"#;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    let xml = match env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SPRAYER_TASK.to_string(),
    };
    let doc = parse_document(&xml)?;
    let mut session = ConversionSession::from_document(&doc, ConversionOptions::default());
    let output = TaskImporter::new().import(&doc, &mut session)?;

    for logged in &output.logged_data {
        println!(
            "task {} ({})",
            logged.id,
            logged.description.as_deref().unwrap_or("-")
        );
        for operation in &logged.operation_data {
            println!(
                "  operation {}: products {:?} elements {:?}",
                operation.id, operation.product_ids, operation.device_element_ids
            );
        }
    }
    for diagnostic in session.diagnostics().iter() {
        println!("{diagnostic}");
    }
    Ok(())
}
