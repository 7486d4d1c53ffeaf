use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use isoxmlctl::cmd_products;
use isoxmlctl::cmd_resolve;
use isoxmlctl::cmd_roundtrip;
use isoxmlctl::cmd_split;
use isoxmlctl::cmd_validate;

#[derive(Parser, Debug)]
#[command(name = "isoxmlctl", version, about = "ISOXML task data CLI")]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check a TASKDATA.XML for structural and reference problems
    Validate { file: PathBuf },
    /// Parse and re-serialise a document
    Roundtrip {
        file: PathBuf,
        /// Write the serialised document here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the product allocation governing a device element
    Resolve {
        file: PathBuf,
        #[arg(long)]
        task: String,
        #[arg(long)]
        element: String,
    },
    /// Partition logged device elements by product identity
    Split {
        file: PathBuf,
        #[arg(long)]
        task: String,
        #[arg(long)]
        device: String,
        /// Comma separated element ids; defaults to every element of the device
        #[arg(long)]
        elements: Option<String>,
    },
    /// List the distinct products allocated in a task
    Products {
        file: PathBuf,
        #[arg(long)]
        task: String,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Validate { file } => cmd_validate::run(&file, json)?,
        Cmd::Roundtrip { file, output } => cmd_roundtrip::run(&file, output.as_deref(), json)?,
        Cmd::Resolve {
            file,
            task,
            element,
        } => cmd_resolve::run(&file, &task, &element, json)?,
        Cmd::Split {
            file,
            task,
            device,
            elements,
        } => cmd_split::run(&file, &task, &device, elements.as_deref(), json)?,
        Cmd::Products { file, task } => cmd_products::run(&file, &task, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_validate_with_global_flags() {
        let cli = Cli::parse_from(["isoxmlctl", "-vv", "--json", "validate", "TASKDATA.XML"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        match cli.cmd {
            Cmd::Validate { file } => assert_eq!(file, PathBuf::from("TASKDATA.XML")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_split_args() {
        let cli = Cli::parse_from([
            "isoxmlctl",
            "split",
            "TASKDATA.XML",
            "--task",
            "TSK1",
            "--device",
            "DVC1",
            "--elements",
            "DET4,DET5",
        ]);
        match cli.cmd {
            Cmd::Split {
                task,
                device,
                elements,
                ..
            } => {
                assert_eq!(task, "TSK1");
                assert_eq!(device, "DVC1");
                assert_eq!(elements.as_deref(), Some("DET4,DET5"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_roundtrip_output() {
        let cli = Cli::parse_from(["isoxmlctl", "roundtrip", "in.xml", "-o", "out.xml"]);
        match cli.cmd {
            Cmd::Roundtrip { output, .. } => {
                assert_eq!(output, Some(PathBuf::from("out.xml")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn resolve_requires_task() {
        let parsed = Cli::try_parse_from(["isoxmlctl", "resolve", "x.xml", "--element", "DET1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn split_runs_against_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TASKDATA.XML");
        std::fs::write(
            &path,
            r#"<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="t" ManagementSoftwareVersion="1" DataTransferOrigin="1">
                 <DVC A="DVC1" D="A00084000F000000" F="31" G="656E">
                   <DET A="DET1" B="1" C="1" E="0" F="0"/>
                   <DET A="DET2" B="2" C="3" E="1" F="1"/>
                 </DVC>
                 <PDT A="PDT1" B="Water" E="0001"/>
                 <TSK A="TSK1" G="4"><PAN A="PDT1" E="DET1"/></TSK>
               </ISO11783_TaskData>"#,
        )
        .unwrap();
        cmd_split::run(&path, "TSK1", "DVC1", None, true).unwrap();
        cmd_resolve::run(&path, "TSK1", "DET2", true).unwrap();
        cmd_products::run(&path, "TSK1", false).unwrap();
        cmd_validate::run(&path, false).unwrap();
        assert!(cmd_split::run(&path, "TSK9", "DVC1", None, false).is_err());
    }
}
