use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::{
    reconcile_interfaces, split_interface_blocks, DialectTable, InterfaceBlock, InterfaceConfig,
    PlanMode, Platform, PolicyList, RunOptions, RunReport, Settings,
};

mod apply;
mod scan;
mod verify;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Full run report as JSON
    Json,
}

/// Inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub(crate) struct RunArgs {
    /// Device running configuration (show running-config output)
    #[arg(short, long)]
    pub(crate) config: PathBuf,

    /// Relay policy list (CSV with Key, Relays, Exclusions columns)
    #[arg(short, long)]
    pub(crate) policy: PathBuf,

    /// Policy list key to enforce
    #[arg(short, long)]
    pub(crate) key: Option<String>,

    /// Device platform
    #[arg(long, value_enum, conflicts_with = "sys_descr")]
    pub(crate) platform: Option<Platform>,

    /// Detect the platform from an SNMP sysDescr string
    #[arg(long)]
    pub(crate) sys_descr: Option<String>,

    /// Device name used in reports (defaults to the config file name)
    #[arg(long)]
    pub(crate) device: Option<String>,

    /// Only reconcile these interfaces (repeatable)
    #[arg(short, long = "interface")]
    pub(crate) interfaces: Vec<String>,

    /// Settings file (TOML)
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,

    /// Show detailed progress for each interface
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

#[derive(Parser)]
#[command(
    name = "relay-enforce",
    about = "Reconcile DHCP relay helper addresses against a policy list",
    long_about = "Supports Cisco IOS, IOS-XE, NX-OS and ASA interface configuration. \
                  Relays listed as exclusions are never removed.",
    after_help = "Examples:\n  relay-enforce scan --config ./edge-01.cfg --policy ./relays.csv --key Site-001 --platform ios\n  relay-enforce verify --config ./edge-01.cfg --policy ./relays.csv --key Site-001 --platform nxos\n  relay-enforce apply --config ./edge-01.cfg --policy ./relays.csv --key Site-001 --platform asa --out ./edge-01.script\n\nRun 'relay-enforce scan --help' to see all flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what would change on each interface (read-only)
    Scan {
        #[command(flatten)]
        run: RunArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the interface configuration diff (exit code indicates changes)
    Verify {
        #[command(flatten)]
        run: RunArgs,

        /// Suppress diff output (exit code still indicates changes)
        #[arg(long)]
        quiet: bool,
    },

    /// Write a configuration session script that converges the device
    Apply {
        #[command(flatten)]
        run: RunArgs,

        /// Output file path for the session script
        #[arg(short, long)]
        out: PathBuf,

        /// Do not save the running configuration at the end of the script
        #[arg(long)]
        no_commit: bool,

        /// Overwrite output file if it exists
        #[arg(long)]
        force: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

pub fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Scan { run, format } => scan::run_scan(run, format),
        Commands::Verify { run, quiet } => verify::run_verify(run, quiet),
        Commands::Apply {
            run,
            out,
            no_commit,
            force,
            format,
        } => apply::run_apply(apply::ApplyArgs {
            run,
            out,
            no_commit,
            force,
            format,
        }),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "relay_enforce=debug"
    } else {
        "relay_enforce=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed when running in-process more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// A completed dry-run or apply pass plus what it was computed from.
pub(crate) struct PreparedRun {
    pub(crate) report: RunReport,
    pub(crate) blocks: Vec<InterfaceBlock>,
    pub(crate) settings: Settings,
    pub(crate) dialects: DialectTable,
    pub(crate) platform: Platform,
    pub(crate) device: String,
    pub(crate) key: String,
}

pub(crate) fn prepare_run(args: &RunArgs, mode: PlanMode) -> Result<PreparedRun> {
    init_logging(args.verbose);

    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let platform = match (args.platform, &args.sys_descr) {
        (Some(platform), _) => platform,
        (None, Some(descr)) => Platform::from_sys_descr(descr)?,
        (None, None) => bail!("Either --platform or --sys-descr must be supplied"),
    };

    let default_key = settings.policy.default_key.as_ref();
    let Some(key) = args.key.as_ref().or(default_key).cloned() else {
        bail!("A policy key must be supplied (--key or [policy] default_key in settings)");
    };

    let dialects = DialectTable::standard();
    dialects.validate()?;

    let policy_file = File::open(&args.policy)
        .with_context(|| format!("Failed to open policy list: {}", args.policy.display()))?;
    let policy = PolicyList::from_reader(policy_file, &settings.policy.columns())
        .with_context(|| format!("Failed to load policy list: {}", args.policy.display()))?;

    let config = fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to open input file: {}", args.config.display()))?;

    let mut blocks = split_interface_blocks(&config);
    if !args.interfaces.is_empty() {
        for wanted in &args.interfaces {
            if !blocks.iter().any(|b| &b.name == wanted) {
                bail!(
                    "Interface {} not found in {}",
                    wanted,
                    args.config.display()
                );
            }
        }
        blocks.retain(|b| args.interfaces.contains(&b.name));
    }

    let device = args.device.clone().unwrap_or_else(|| {
        args.config
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "device".to_string())
    });

    let interfaces: Vec<InterfaceConfig> = blocks
        .iter()
        .map(|block| InterfaceConfig {
            device: device.clone(),
            name: block.name.clone(),
            platform,
            policy_key: None,
            config: block.text.clone(),
        })
        .collect();

    let options = RunOptions {
        mode,
        default_key: Some(key.clone()),
        only_with_relays: true,
    };
    let report = reconcile_interfaces(&interfaces, &policy, &dialects, &options);

    Ok(PreparedRun {
        report,
        blocks,
        settings,
        dialects,
        platform,
        device,
        key,
    })
}

pub(crate) fn print_report(run: &PreparedRun, verbose: bool) {
    let stats = &run.report.stats;
    println!("Device: {} ({})", run.device, run.platform);
    println!("Policy key: {}", run.key);
    println!("Interfaces scanned: {}", stats.interfaces_seen);
    println!("Interfaces with relays: {}", stats.interfaces_with_relays);
    println!(
        "Plans generated: {} ({} already compliant)",
        stats.plans_generated, stats.noop_plans
    );
    println!("Relays to remove: {}", stats.relays_to_remove);
    println!("Relays to add: {}", stats.relays_to_add);
    println!("Interfaces skipped: {}", stats.interfaces_skipped);

    for plan in &run.report.plans {
        if plan.noop && !verbose {
            continue;
        }
        if plan.noop {
            println!("  {}: compliant", plan.interface);
            continue;
        }
        println!("  {}:", plan.interface);
        for addr in &plan.to_remove {
            println!("    REMOVE: {}", addr);
        }
        for addr in &plan.to_add {
            println!("    ADD: {}", addr);
        }
    }

    if !run.report.anomalies.is_empty() {
        println!("Anomalies: {}", run.report.anomalies.len());
        for anomaly in &run.report.anomalies {
            match &anomaly.interface {
                Some(iface) => println!("  Warning: {}: {}", iface, anomaly.detail),
                None => println!("  Warning: {}", anomaly.detail),
            }
        }
    }
}
