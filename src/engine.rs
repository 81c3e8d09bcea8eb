use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::parser::extract_relays;
use crate::policy::{resolve, PolicySource, ResolvedPolicy};
use crate::reconcile::reconcile;
use crate::{
    Anomaly, ChangePlan, DialectTable, InterfaceConfig, ReconcileError, RunOptions, RunReport,
    RunStats,
};

/// Reconcile every interface against the policy list.
///
/// Each interface is handled on its own: a missing policy or unsupported
/// platform skips that interface and is reported, the rest still get plans.
pub fn reconcile_interfaces<S: PolicySource + ?Sized>(
    interfaces: &[InterfaceConfig],
    policy: &S,
    dialects: &DialectTable,
    options: &RunOptions,
) -> RunReport {
    let mut stats = RunStats::default();
    let mut plans = Vec::new();
    let mut anomalies = Vec::new();
    let mut resolved: HashMap<String, Result<ResolvedPolicy, ReconcileError>> = HashMap::new();

    for iface in interfaces {
        stats.interfaces_seen += 1;

        let parsed = extract_relays(&iface.config, iface.platform);
        for line in &parsed.anomalies {
            let error = ReconcileError::ConfigParseAnomaly {
                interface: iface.name.clone(),
                detail: format!("line {}: {}", line.line_no, line.detail),
            };
            warn!(device = %iface.device, interface = %iface.name, "{}", error);
            anomalies.push(Anomaly::for_interface(&iface.name, &error));
        }

        if !parsed.relays.is_empty() {
            stats.interfaces_with_relays += 1;
        } else if options.only_with_relays {
            debug!(interface = %iface.name, "no relay helpers configured");
            continue;
        }

        let key = iface
            .policy_key
            .as_deref()
            .or(options.default_key.as_deref())
            .unwrap_or("");

        let resolution = resolved.entry(key.to_string()).or_insert_with(|| {
            let result = resolve(policy, key);
            if let Ok(found) = &result {
                anomalies.extend(found.warnings.iter().cloned());
            }
            result
        });

        let entry = match resolution {
            Ok(found) => &found.entry,
            Err(error) => {
                warn!(interface = %iface.name, "{}", error);
                anomalies.push(Anomaly::for_interface(&iface.name, error));
                stats.interfaces_skipped += 1;
                continue;
            }
        };

        let decision = reconcile(&parsed.relays, &entry.relays, &entry.exclusions);
        debug!(
            interface = %iface.name,
            remove = decision.to_remove.len(),
            add = decision.to_add.len(),
            "reconciled"
        );

        let commands = match dialects.render(&decision, iface.platform) {
            Ok(commands) => commands,
            Err(error) => {
                warn!(interface = %iface.name, "{}", error);
                anomalies.push(Anomaly::for_interface(&iface.name, &error));
                stats.interfaces_skipped += 1;
                continue;
            }
        };

        stats.relays_to_remove += decision.to_remove.len();
        stats.relays_to_add += decision.to_add.len();

        let plan = ChangePlan::assemble(iface, &entry.key, decision, commands, options.mode);
        stats.plans_generated += 1;
        if plan.noop {
            stats.noop_plans += 1;
        }
        plans.push(plan);
    }

    stats.anomalies = anomalies.len();
    info!(
        interfaces = stats.interfaces_seen,
        plans = stats.plans_generated,
        remove = stats.relays_to_remove,
        add = stats.relays_to_add,
        anomalies = stats.anomalies,
        "reconciliation pass complete"
    );

    RunReport {
        run_id: Uuid::new_v4(),
        mode: options.mode,
        plans,
        anomalies,
        stats,
    }
}
