pub mod address;
pub mod cli;
pub mod engine;
mod errors;
pub mod parser;
pub mod plan;
mod platform;
pub mod policy;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod settings;
mod types;

pub use address::{AddressSet, RelayAddress};
pub use engine::reconcile_interfaces;
pub use errors::ReconcileError;
pub use parser::{extract_relays, split_interface_blocks, InterfaceBlock, ParsedRelays};
pub use plan::{ChangePlan, PlanMode};
pub use platform::Platform;
pub use policy::{resolve, PolicyColumns, PolicyEntry, PolicyList, PolicyRow, PolicySource};
pub use reconcile::{reconcile, ReconciliationDecision};
pub use render::{Dialect, DialectTable};
pub use session::{execute, CommandResult, ConfigSession, ExecutionOutcome, ScriptSession};
pub use settings::Settings;
pub use types::{Anomaly, AnomalyReason, InterfaceConfig, RunOptions, RunReport, RunStats};
