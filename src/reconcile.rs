use serde::Serialize;

use crate::{AddressSet, RelayAddress};

/// Relays to remove from and add to one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationDecision {
    /// In the order the relays appear in the device configuration.
    pub to_remove: Vec<RelayAddress>,
    /// In the order the relays appear in the policy entry.
    pub to_add: Vec<RelayAddress>,
}

impl ReconciliationDecision {
    pub fn is_noop(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Compute the changes that converge `configured` to policy.
///
/// Excluded relays are never removed and never added, even when the
/// caller passes an `authorized` set that overlaps `exclusions`.
pub fn reconcile(
    configured: &AddressSet,
    authorized: &AddressSet,
    exclusions: &AddressSet,
) -> ReconciliationDecision {
    let to_remove = configured
        .iter()
        .filter(|a| !authorized.contains(a) && !exclusions.contains(a))
        .copied()
        .collect();

    let to_add = authorized
        .iter()
        .filter(|a| !configured.contains(a) && !exclusions.contains(a))
        .copied()
        .collect();

    ReconciliationDecision { to_remove, to_add }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{addr, set};

    #[test]
    fn test_removes_unauthorized_keeps_excluded_adds_missing() {
        let decision = reconcile(
            &set(&["10.1.1.1", "10.1.1.2", "10.9.9.9"]),
            &set(&["10.1.1.1", "10.1.1.3"]),
            &set(&["10.9.9.9"]),
        );
        assert_eq!(decision.to_remove, vec![addr("10.1.1.2")]);
        assert_eq!(decision.to_add, vec![addr("10.1.1.3")]);
    }

    #[test]
    fn test_empty_configured_adds_policy_in_order() {
        let decision = reconcile(
            &AddressSet::new(),
            &set(&["10.1.240.2", "10.1.240.1"]),
            &AddressSet::new(),
        );
        assert!(decision.to_remove.is_empty());
        assert_eq!(
            decision.to_add,
            vec![addr("10.1.240.2"), addr("10.1.240.1")]
        );
    }

    #[test]
    fn test_empty_authorized_strips_all_but_exclusions() {
        let decision = reconcile(
            &set(&["10.1.1.5", "10.9.9.9", "10.1.1.4"]),
            &AddressSet::new(),
            &set(&["10.9.9.9"]),
        );
        assert_eq!(decision.to_remove, vec![addr("10.1.1.5"), addr("10.1.1.4")]);
        assert!(decision.to_add.is_empty());
    }

    #[test]
    fn test_removal_order_follows_configuration() {
        let decision = reconcile(
            &set(&["10.0.0.9", "10.0.0.1", "10.0.0.5"]),
            &set(&["10.0.0.1"]),
            &AddressSet::new(),
        );
        assert_eq!(decision.to_remove, vec![addr("10.0.0.9"), addr("10.0.0.5")]);
    }

    #[test]
    fn test_overlapping_authorized_and_excluded_is_never_added() {
        let decision = reconcile(
            &AddressSet::new(),
            &set(&["10.1.1.1", "10.9.9.9"]),
            &set(&["10.9.9.9"]),
        );
        assert_eq!(decision.to_add, vec![addr("10.1.1.1")]);
    }

    #[test]
    fn test_converged_interface_is_noop() {
        let authorized = set(&["10.1.1.1", "10.1.1.3"]);
        let exclusions = set(&["10.9.9.9", "10.8.8.8"]);
        let configured = set(&["10.9.9.9", "10.1.1.3", "10.1.1.1"]);
        let decision = reconcile(&configured, &authorized, &exclusions);
        assert!(decision.is_noop());
    }

    #[test]
    fn test_set_properties_over_sample_grid() {
        let pool = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"];
        // Every split of the pool into three membership bitmaps.
        for mask in 0u32..(1 << (pool.len() * 3)) {
            let pick = |shift: usize| -> AddressSet {
                pool.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << (i + shift)) != 0)
                    .map(|(_, s)| addr(s))
                    .collect()
            };
            let configured = pick(0);
            let authorized = pick(pool.len());
            let exclusions = pick(pool.len() * 2);

            let d = reconcile(&configured, &authorized, &exclusions);
            assert!(d.to_remove.iter().all(|a| !exclusions.contains(a)));
            assert!(d.to_remove.iter().all(|a| !authorized.contains(a)));
            assert!(d.to_add.iter().all(|a| !configured.contains(a)));
            assert!(d.to_add.iter().all(|a| !exclusions.contains(a)));

            let converged = authorized.union(&configured.intersection(&exclusions));
            assert!(reconcile(&converged, &authorized, &exclusions).is_noop());
        }
    }
}
