use serde::Serialize;
use std::fmt;

use crate::parser::dialect::{match_line, LineMatch};
use crate::{InterfaceConfig, Platform, ReconciliationDecision, RelayAddress};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlanMode {
    /// Compute and report only
    #[default]
    DryRun,
    /// Hand plans to the configuration session
    Apply,
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanMode::DryRun => write!(f, "dry-run"),
            PlanMode::Apply => write!(f, "apply"),
        }
    }
}

/// Ordered commands for one interface, ready for a configuration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePlan {
    pub device: String,
    pub interface: String,
    pub platform: Platform,
    pub policy_key: String,
    pub mode: PlanMode,
    /// Nothing to send; the session for this interface can be skipped.
    pub noop: bool,
    pub to_remove: Vec<RelayAddress>,
    pub to_add: Vec<RelayAddress>,
    pub commands: Vec<String>,
}

impl ChangePlan {
    pub fn assemble(
        iface: &InterfaceConfig,
        policy_key: &str,
        decision: ReconciliationDecision,
        commands: Vec<String>,
        mode: PlanMode,
    ) -> Self {
        ChangePlan {
            device: iface.device.clone(),
            interface: iface.name.clone(),
            platform: iface.platform,
            policy_key: policy_key.to_string(),
            mode,
            noop: decision.is_noop(),
            to_remove: decision.to_remove,
            to_add: decision.to_add,
            commands,
        }
    }

    /// The interface text as it would read once this plan is applied.
    ///
    /// Removed relay lines are dropped and added relays are appended at the
    /// end of the stanza, using the indentation of the stanza body.
    pub fn preview(&self, block: &str) -> String {
        let mut indent = " ".to_string();
        let mut out = String::with_capacity(block.len());

        for line in block.lines() {
            if let LineMatch::Relay(addr) = match_line(line, self.platform) {
                if self.to_remove.contains(&addr) {
                    continue;
                }
            }
            if line.starts_with(char::is_whitespace) {
                let width = line.len() - line.trim_start().len();
                indent = line[..width].to_string();
            }
            out.push_str(line);
            out.push('\n');
        }

        for cmd in self.addition_commands() {
            out.push_str(&indent);
            out.push_str(cmd);
            out.push('\n');
        }

        out
    }

    /// Commands of this plan that add relays.
    pub fn addition_commands(&self) -> &[String] {
        let start = self.commands.len().saturating_sub(self.to_add.len());
        &self.commands[start..]
    }
}
