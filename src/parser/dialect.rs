use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Platform, RelayAddress};

static IOS_HELPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ip\s+helper-address(?:\s+(?P<args>.*))?$")
        .expect("Invalid regex pattern")
});
static NXOS_RELAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ip\s+dhcp\s+relay\s+address(?:\s+(?P<args>.*))?$")
        .expect("Invalid regex pattern")
});
static ASA_RELAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^dhcprelay\s+server(?:\s+(?P<args>.*))?$")
        .expect("Invalid regex pattern")
});

fn pattern_for(platform: Platform) -> &'static Regex {
    match platform {
        Platform::Ios | Platform::IosXe => &*IOS_HELPER,
        Platform::Nxos => &*NXOS_RELAY,
        Platform::Asa => &*ASA_RELAY,
    }
}

/// Outcome of matching one configuration line against a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineMatch {
    Relay(RelayAddress),
    Anomaly(String),
    NoMatch,
}

/// Match a single configuration line against the relay grammar of `platform`.
pub(crate) fn match_line(line: &str, platform: Platform) -> LineMatch {
    let line = line.trim();
    if line.is_empty() || line.starts_with('!') {
        return LineMatch::NoMatch;
    }

    let Some(caps) = pattern_for(platform).captures(line) else {
        return LineMatch::NoMatch;
    };

    let args: Vec<&str> = caps
        .name("args")
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default();

    let Some((first, rest)) = args.split_first() else {
        return LineMatch::Anomaly(format!("missing relay address in {line:?}"));
    };

    if first.eq_ignore_ascii_case("vrf") || first.eq_ignore_ascii_case("global") {
        return LineMatch::Anomaly(format!("vrf-scoped relay not supported: {line:?}"));
    }
    if rest
        .iter()
        .any(|t| t.eq_ignore_ascii_case("use-vrf") || t.eq_ignore_ascii_case("vrf"))
    {
        return LineMatch::Anomaly(format!("vrf-scoped relay not supported: {line:?}"));
    }
    if !rest.is_empty() {
        return LineMatch::Anomaly(format!("unexpected arguments after relay address: {line:?}"));
    }

    match first.parse::<RelayAddress>() {
        Ok(addr) => LineMatch::Relay(addr),
        Err(_) => LineMatch::Anomaly(format!("invalid relay address {first:?} in {line:?}")),
    }
}
