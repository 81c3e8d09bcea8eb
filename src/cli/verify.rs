use anyhow::{anyhow, Result};
use std::io::{self, Write};

use super::{prepare_run, RunArgs};
use crate::PlanMode;

pub(crate) fn run_verify(args: RunArgs, quiet: bool) -> Result<()> {
    let run = prepare_run(&args, PlanMode::DryRun)?;

    if !run.report.has_changes() {
        if !quiet {
            println!("No changes.");
        }
        return Ok(());
    }

    if !quiet {
        let mut before = String::new();
        let mut after = String::new();
        for block in &run.blocks {
            before.push_str(&block.text);
            match run.report.plan_for(&block.name) {
                Some(plan) if !plan.noop => after.push_str(&plan.preview(&block.text)),
                _ => after.push_str(&block.text),
            }
        }

        let diff = similar::TextDiff::from_lines(&before, &after);
        let mut out = io::stdout().lock();
        let unified = diff
            .unified_diff()
            .context_radius(3)
            .header("running-config", "reconciled")
            .to_string();
        write!(out, "{}", unified)?;
    }

    Err(anyhow!("verify: changes detected"))
}
