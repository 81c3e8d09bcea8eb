use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use super::{prepare_run, print_report, OutputFormat, RunArgs};
use crate::{execute, PlanMode, ScriptSession};

pub(crate) struct ApplyArgs {
    pub(crate) run: RunArgs,
    pub(crate) out: PathBuf,
    pub(crate) no_commit: bool,
    pub(crate) force: bool,
    pub(crate) format: OutputFormat,
}

pub(crate) fn run_apply(args: ApplyArgs) -> Result<()> {
    // Critical safety check: never overwrite the device configuration input
    let in_canonical =
        std::fs::canonicalize(&args.run.config).unwrap_or_else(|_| args.run.config.clone());
    let (out_canonical, out_missing) = match std::fs::canonicalize(&args.out) {
        Ok(path) => (path, false),
        Err(e) => (args.out.clone(), e.kind() == io::ErrorKind::NotFound),
    };

    if in_canonical == out_canonical {
        bail!(
            concat!(
                "Output path must be different from input path (refusing to overwrite input).\n",
                "Input:  {}\n",
                "Output: {}"
            ),
            in_canonical.display(),
            out_canonical.display()
        );
    }
    if out_missing {
        if let (Some(parent), Some(file_name)) = (args.out.parent(), args.out.file_name()) {
            if let Ok(parent_canonical) = std::fs::canonicalize(parent) {
                let reconstructed_out = parent_canonical.join(file_name);
                if reconstructed_out == in_canonical {
                    bail!(
                        concat!(
                            "Output path must be different from input path (refusing to overwrite input).\n",
                            "Input:  {}\n",
                            "Output: {}"
                        ),
                        in_canonical.display(),
                        reconstructed_out.display()
                    );
                }
            }
        }
    }

    if !args.force && args.out.exists() {
        bail!(
            "Output file already exists: {} (use --force to overwrite)",
            args.out.display()
        );
    }

    let run = prepare_run(&args.run, PlanMode::Apply)?;

    let commit = run.settings.apply.commit && !args.no_commit;
    let mut session = ScriptSession::new(
        run.dialects.dialect(run.platform)?,
        commit,
        vec![
            format!("relay-enforce run {}", run.report.run_id),
            format!(
                "device {} ({}) policy key {}",
                run.device, run.platform, run.key
            ),
        ],
    );
    let outcome = execute(&run.report.plans, &mut session);
    if !outcome.is_success() {
        bail!(
            "{} relay command(s) were rejected by the session",
            outcome.failed.len()
        );
    }
    let script = session.finish();

    let tmp_path = args
        .out
        .with_extension(format!("tmp.{}", std::process::id()));
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary output file: {}",
                tmp_path.display()
            )
        })?;

    if let Err(e) = tmp_file
        .write_all(script.as_bytes())
        .and_then(|_| tmp_file.sync_all())
    {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e).with_context(|| {
            format!(
                "Failed to write temporary output file: {}",
                tmp_path.display()
            )
        });
    }

    if args.force && args.out.exists() {
        std::fs::remove_file(&args.out).with_context(|| {
            format!(
                "Failed to remove existing output file: {}",
                args.out.display()
            )
        })?;
    }

    std::fs::rename(&tmp_path, &args.out)
        .with_context(|| format!("Failed to replace output file: {}", args.out.display()))?;

    match args.format {
        OutputFormat::Text => {
            print_report(&run, args.run.verbose);
            println!(
                "Interfaces changed: {} (skipped as compliant: {})",
                outcome.applied.len(),
                outcome.skipped_noop.len()
            );
            println!("Change script written to: {}", args.out.display());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run.report)?),
    }

    Ok(())
}
