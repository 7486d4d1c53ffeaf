use std::path::Path;

use anyhow::{bail, Result};
use isoxml::adm::Diagnostic;
use isoxml::iso::{TaskData, ValidationError};
use isoxml::ConversionOptions;
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Serialize)]
struct Violation {
    element: String,
    attribute: String,
    message: String,
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    violations: Vec<Violation>,
    diagnostics: &'a [Diagnostic],
}

/// Codec violations, and the diagnostics a session adds on top of them.
fn check(doc: &TaskData) -> (Vec<ValidationError>, Vec<Diagnostic>) {
    let options = ConversionOptions {
        validate: false,
        ..ConversionOptions::default()
    };
    let extra = common::open_session_with(doc, options)
        .finish()
        .into_entries();
    (doc.validation_errors(), extra)
}

pub fn run(path: &Path, json: bool) -> Result<()> {
    let doc = common::load_document(path)?;
    let (errors, extra) = check(&doc);
    info!(violations = errors.len(), diagnostics = extra.len(), "validated");

    if json {
        let report = Report {
            file: path.display().to_string(),
            violations: errors
                .iter()
                .map(|err| Violation {
                    element: err.element.clone(),
                    attribute: err.attribute.clone(),
                    message: err.kind.to_string(),
                })
                .collect(),
            diagnostics: &extra,
        };
        common::print_json(&report)?;
    } else {
        for err in &errors {
            println!("{err}");
        }
        for diagnostic in &extra {
            println!("{diagnostic}");
        }
        if errors.is_empty() && extra.is_empty() {
            println!("{}: ok", path.display());
        }
    }

    if !errors.is_empty() {
        bail!("{} structural violation(s) in {}", errors.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoxml::adm::DiagnosticKind;

    #[test]
    fn violations_are_not_repeated_as_diagnostics() {
        let doc = isoxml::iso::parse_document(
            r#"<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="t" ManagementSoftwareVersion="1" DataTransferOrigin="1">
                 <DVC A="DVC1" D="A00084000F000000" F="31" G="656E">
                   <DET A="DET1" B="1" C="1" E="0" F="0"/>
                   <DET A="DET2" B="2" C="3" E="1" F="9"/>
                 </DVC>
                 <PDT A="PDT1"/>
               </ISO11783_TaskData>"#,
        )
        .unwrap();
        let (errors, extra) = check(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].attribute, "B");
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].kind, DiagnosticKind::Reference);
        assert!(extra[0].message.contains("DET2"));
    }
}
