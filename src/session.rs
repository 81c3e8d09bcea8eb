use serde::Serialize;
use tracing::{debug, warn};

use crate::{ChangePlan, Dialect, PlanMode};

/// Result of one command sent to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub command: String,
    pub success: bool,
    pub detail: Option<String>,
}

impl CommandResult {
    pub fn ok(command: &str) -> Self {
        CommandResult {
            command: command.to_string(),
            success: true,
            detail: None,
        }
    }

    pub fn failed(command: &str, detail: impl Into<String>) -> Self {
        CommandResult {
            command: command.to_string(),
            success: false,
            detail: Some(detail.into()),
        }
    }
}

/// A configuration session on one device.
///
/// `send` enters the plan's interface context, sends the plan's commands in
/// order and reports a result per command. Holding the session mutably keeps
/// one command stream per device.
pub trait ConfigSession {
    fn send(&mut self, plan: &ChangePlan) -> Vec<CommandResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCommand {
    pub interface: String,
    pub command: String,
    pub detail: Option<String>,
}

/// Aggregated outcome of handing a batch of plans to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Interfaces whose commands all succeeded.
    pub applied: Vec<String>,
    pub skipped_noop: Vec<String>,
    pub skipped_dry_run: Vec<String>,
    pub failed: Vec<FailedCommand>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send every applicable plan to `session`.
///
/// No-op and dry-run plans are never sent. A failing command is recorded
/// and the remaining plans are still sent.
pub fn execute<S: ConfigSession + ?Sized>(
    plans: &[ChangePlan],
    session: &mut S,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for plan in plans {
        if plan.noop {
            debug!(interface = %plan.interface, "no changes, skipping session");
            outcome.skipped_noop.push(plan.interface.clone());
            continue;
        }
        if plan.mode == PlanMode::DryRun {
            outcome.skipped_dry_run.push(plan.interface.clone());
            continue;
        }

        let results = session.send(plan);
        let mut all_ok = results.len() == plan.commands.len();
        for result in results.iter().filter(|r| !r.success) {
            all_ok = false;
            warn!(
                interface = %plan.interface,
                command = %result.command,
                detail = result.detail.as_deref().unwrap_or(""),
                "command failed"
            );
            outcome.failed.push(FailedCommand {
                interface: plan.interface.clone(),
                command: result.command.clone(),
                detail: result.detail.clone(),
            });
        }
        if results.len() != plan.commands.len() {
            outcome.failed.push(FailedCommand {
                interface: plan.interface.clone(),
                command: String::new(),
                detail: Some(format!(
                    "session returned {} results for {} commands",
                    results.len(),
                    plan.commands.len()
                )),
            });
        }
        if all_ok {
            outcome.applied.push(plan.interface.clone());
        }
    }

    outcome
}

/// Session that records a configuration script instead of talking to a
/// device. Every command is accepted.
#[derive(Debug, Clone)]
pub struct ScriptSession {
    header: Vec<String>,
    body: Vec<String>,
    save_command: Option<String>,
}

impl ScriptSession {
    /// `save_command` is appended after `end` when `commit` is set.
    pub fn new(dialect: &Dialect, commit: bool, header: Vec<String>) -> Self {
        ScriptSession {
            header,
            body: Vec::new(),
            save_command: commit.then(|| dialect.save_command.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn finish(self) -> String {
        let mut lines: Vec<String> = self.header.iter().map(|h| format!("! {h}")).collect();
        if self.body.is_empty() {
            lines.push("! no changes".to_string());
        } else {
            lines.push("enable".to_string());
            lines.push("configure terminal".to_string());
            lines.extend(self.body);
            lines.push("end".to_string());
            if let Some(save) = self.save_command {
                lines.push(save);
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl ConfigSession for ScriptSession {
    fn send(&mut self, plan: &ChangePlan) -> Vec<CommandResult> {
        self.body.push(format!("interface {}", plan.interface));
        let mut results = Vec::with_capacity(plan.commands.len());
        for cmd in &plan.commands {
            self.body.push(format!(" {cmd}"));
            results.push(CommandResult::ok(cmd));
        }
        self.body.push("exit".to_string());
        results
    }
}
