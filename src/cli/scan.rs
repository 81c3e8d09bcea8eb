use anyhow::Result;

use super::{prepare_run, print_report, OutputFormat, RunArgs};
use crate::PlanMode;

pub(crate) fn run_scan(args: RunArgs, format: OutputFormat) -> Result<()> {
    let run = prepare_run(&args, PlanMode::DryRun)?;

    match format {
        OutputFormat::Text => print_report(&run, args.verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run.report)?),
    }

    Ok(())
}
