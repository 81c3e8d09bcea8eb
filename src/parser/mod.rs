//! Extraction of configured relay helper addresses from interface text.

mod blocks;
pub(crate) mod dialect;

pub use blocks::{split_interface_blocks, InterfaceBlock};

use crate::{AddressSet, Platform};
use dialect::{match_line, LineMatch};

/// A relay line that matched the dialect keyword but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAnomaly {
    /// 1-based line number within the interface text.
    pub line_no: usize,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRelays {
    /// Configured relays in the order they appear, duplicates collapsed.
    pub relays: AddressSet,
    pub anomalies: Vec<LineAnomaly>,
}

/// Extract the relay helper addresses configured in one interface's text.
///
/// Malformed relay lines are skipped and reported; they never stop the
/// rest of the text from being processed.
pub fn extract_relays(config: &str, platform: Platform) -> ParsedRelays {
    let mut parsed = ParsedRelays::default();

    for (idx, line) in config.lines().enumerate() {
        match match_line(line, platform) {
            LineMatch::Relay(addr) => {
                parsed.relays.insert(addr);
            }
            LineMatch::Anomaly(detail) => parsed.anomalies.push(LineAnomaly {
                line_no: idx + 1,
                detail,
            }),
            LineMatch::NoMatch => {}
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::addr;

    #[test]
    fn test_extracts_in_order_and_collapses_duplicates() {
        let config = "\
interface Vlan10
 ip helper-address 10.1.1.2
 ip helper-address 10.1.1.1
 ip helper-address 10.01.1.2
 ip helper-address 10.9.9.9
";
        let parsed = extract_relays(config, Platform::IosXe);
        assert_eq!(
            parsed.relays.as_slice(),
            &[addr("10.1.1.2"), addr("10.1.1.1"), addr("10.9.9.9")]
        );
        assert!(parsed.anomalies.is_empty());
    }

    #[test]
    fn test_malformed_line_does_not_abort() {
        let config = "\
interface Vlan10
 ip helper-address 10.1.1.999
 ip helper-address 10.1.1.1
";
        let parsed = extract_relays(config, Platform::Ios);
        assert_eq!(parsed.relays.as_slice(), &[addr("10.1.1.1")]);
        assert_eq!(parsed.anomalies.len(), 1);
        assert_eq!(parsed.anomalies[0].line_no, 2);
        assert!(parsed.anomalies[0].detail.contains("10.1.1.999"));
    }

    #[test]
    fn test_other_dialects_are_ignored() {
        let config = " ip helper-address 10.1.1.1\n dhcprelay server 10.2.2.2\n";
        let parsed = extract_relays(config, Platform::Nxos);
        assert!(parsed.relays.is_empty());
        assert!(parsed.anomalies.is_empty());

        let parsed = extract_relays(config, Platform::Asa);
        assert_eq!(parsed.relays.as_slice(), &[addr("10.2.2.2")]);
    }
}
