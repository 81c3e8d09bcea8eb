use serde::Serialize;
use std::io::Read;
use tracing::warn;

use crate::{AddressSet, Anomaly, ReconcileError};

/// Column names of the relay policy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyColumns {
    pub key: String,
    pub relays: String,
    pub exclusions: String,
}

impl Default for PolicyColumns {
    fn default() -> Self {
        PolicyColumns {
            key: "Key".to_string(),
            relays: "Relays".to_string(),
            exclusions: "Exclusions".to_string(),
        }
    }
}

/// One raw row of the policy list; address cells are not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRow {
    pub key: String,
    pub relays: String,
    pub exclusions: String,
}

/// Lookup side of the policy list collaborator.
pub trait PolicySource {
    /// Every row whose key matches `key` exactly, in list order.
    fn rows_for_key(&self, key: &str) -> Vec<&PolicyRow>;
}

/// Relay policy list loaded from a CSV export.
#[derive(Debug, Clone, Default)]
pub struct PolicyList {
    rows: Vec<PolicyRow>,
}

impl PolicyList {
    pub fn from_rows(rows: Vec<PolicyRow>) -> Self {
        PolicyList { rows }
    }

    /// Read a CSV policy list. `#` lines are comments; the first remaining
    /// line is the header. The exclusions column is optional.
    pub fn from_reader<R: Read>(
        reader: R,
        columns: &PolicyColumns,
    ) -> Result<Self, ReconcileError> {
        let mut rdr = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(csv_error)?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let key_idx = column(&columns.key).ok_or_else(|| {
            ReconcileError::PolicyListFormat(format!("missing column {:?}", columns.key))
        })?;
        let relays_idx = column(&columns.relays).ok_or_else(|| {
            ReconcileError::PolicyListFormat(format!("missing column {:?}", columns.relays))
        })?;
        let exclusions_idx = column(&columns.exclusions);

        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec.map_err(csv_error)?;
            let key = rec.get(key_idx).unwrap_or("").to_string();
            if key.is_empty() {
                continue;
            }
            rows.push(PolicyRow {
                key,
                relays: rec.get(relays_idx).unwrap_or("").to_string(),
                exclusions: exclusions_idx
                    .and_then(|idx| rec.get(idx))
                    .unwrap_or("")
                    .to_string(),
            });
        }

        Ok(PolicyList { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn csv_error(e: csv::Error) -> ReconcileError {
    ReconcileError::PolicyListFormat(format!("csv parse error: {}", e))
}

impl PolicySource for PolicyList {
    fn rows_for_key(&self, key: &str) -> Vec<&PolicyRow> {
        self.rows.iter().filter(|row| row.key == key).collect()
    }
}

/// Validated policy for one key. `relays` and `exclusions` are disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEntry {
    pub key: String,
    pub relays: AddressSet,
    pub exclusions: AddressSet,
}

#[derive(Debug, Clone)]
pub struct ResolvedPolicy {
    pub entry: PolicyEntry,
    /// Recovered `PolicyMalformed` conditions.
    pub warnings: Vec<Anomaly>,
}

/// Resolve the policy entry for `key`.
///
/// Only a missing key is an error. Duplicate keys, invalid addresses and
/// relays that are also excluded are repaired (first row wins, bad items
/// dropped, exclusions win) and reported as warnings.
pub fn resolve<S: PolicySource + ?Sized>(
    source: &S,
    key: &str,
) -> Result<ResolvedPolicy, ReconcileError> {
    let rows = source.rows_for_key(key);
    let Some(row) = rows.first() else {
        return Err(ReconcileError::PolicyNotFound(key.to_string()));
    };

    let mut warnings = Vec::new();
    let mut malformed = |detail: String| {
        let error = ReconcileError::PolicyMalformed {
            key: key.to_string(),
            detail,
        };
        warn!(key, "{}", error);
        warnings.push(Anomaly::global(&error));
    };

    if rows.len() > 1 {
        malformed(format!(
            "key appears {} times in the policy list; using the first occurrence",
            rows.len()
        ));
    }

    let (mut relays, invalid_relays) = AddressSet::parse_list(&row.relays);
    for item in invalid_relays {
        malformed(format!("invalid relay address {:?} ignored", item));
    }
    let (exclusions, invalid_exclusions) = AddressSet::parse_list(&row.exclusions);
    for item in invalid_exclusions {
        malformed(format!("invalid exclusion address {:?} ignored", item));
    }

    for overlap in relays.intersection(&exclusions).iter() {
        relays.remove(overlap);
        malformed(format!(
            "{} is listed in both relays and exclusions; exclusion wins",
            overlap
        ));
    }

    Ok(ResolvedPolicy {
        entry: PolicyEntry {
            key: key.to_string(),
            relays,
            exclusions,
        },
        warnings,
    })
}
