use ipnet::Ipv4Net;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::ReconcileError;

/// Networks that can never be a DHCP relay target.
static UNUSABLE_NETS: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    [
        (Ipv4Addr::new(0, 0, 0, 0), 8),
        (Ipv4Addr::new(127, 0, 0, 0), 8),
        (Ipv4Addr::new(224, 0, 0, 0), 4),
        (Ipv4Addr::new(240, 0, 0, 0), 4),
    ]
    .into_iter()
    .filter_map(|(addr, prefix)| Ipv4Net::new(addr, prefix).ok())
    .collect()
});

/// A normalized IPv4 relay helper address.
///
/// Parsing accepts surrounding whitespace and zero-padded octets, so
/// `010.001.001.001` and `10.1.1.1` are the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct RelayAddress(Ipv4Addr);

impl RelayAddress {
    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }
}

impl FromStr for RelayAddress {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ReconcileError::InvalidRelayAddress(raw.to_string());

        let mut octets = [0u8; 4];
        let mut parts = raw.split('.');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *octet = part.parse().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        let addr = Ipv4Addr::from(octets);
        if UNUSABLE_NETS.iter().any(|net| net.contains(&addr)) {
            return Err(invalid());
        }

        Ok(RelayAddress(addr))
    }
}

impl TryFrom<String> for RelayAddress {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Addr> for RelayAddress {
    fn from(addr: Ipv4Addr) -> Self {
        RelayAddress(addr)
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RelayAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Insertion-ordered set of relay addresses.
///
/// Membership and equality use the normalized address; iteration yields
/// addresses in the order they were first inserted.
#[derive(Debug, Clone, Default)]
pub struct AddressSet {
    order: Vec<RelayAddress>,
    members: HashSet<RelayAddress>,
}

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address, returning false if it was already present.
    pub fn insert(&mut self, addr: RelayAddress) -> bool {
        if self.members.insert(addr) {
            self.order.push(addr);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, addr: &RelayAddress) -> bool {
        if self.members.remove(addr) {
            self.order.retain(|a| a != addr);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, addr: &RelayAddress) -> bool {
        self.members.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RelayAddress> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[RelayAddress] {
        &self.order
    }

    /// Addresses of `self` not in `other`, in `self`'s order.
    pub fn difference(&self, other: &AddressSet) -> AddressSet {
        self.iter()
            .filter(|a| !other.contains(a))
            .copied()
            .collect()
    }

    /// Addresses of `self` also in `other`, in `self`'s order.
    pub fn intersection(&self, other: &AddressSet) -> AddressSet {
        self.iter().filter(|a| other.contains(a)).copied().collect()
    }

    /// All of `self` followed by the members of `other` not yet present.
    pub fn union(&self, other: &AddressSet) -> AddressSet {
        self.iter().chain(other.iter()).copied().collect()
    }

    pub fn is_disjoint(&self, other: &AddressSet) -> bool {
        self.members.is_disjoint(&other.members)
    }

    /// Parse a comma-delimited address list.
    ///
    /// Empty items are ignored. Items that fail validation are returned
    /// separately so the caller can report them.
    pub fn parse_list(cell: &str) -> (AddressSet, Vec<String>) {
        let mut set = AddressSet::new();
        let mut invalid = Vec::new();
        for item in cell.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match item.parse::<RelayAddress>() {
                Ok(addr) => {
                    set.insert(addr);
                }
                Err(_) => invalid.push(item.to_string()),
            }
        }
        (set, invalid)
    }
}

impl PartialEq for AddressSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for AddressSet {}

impl FromIterator<RelayAddress> for AddressSet {
    fn from_iter<I: IntoIterator<Item = RelayAddress>>(iter: I) -> Self {
        let mut set = AddressSet::new();
        for addr in iter {
            set.insert(addr);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a RelayAddress;
    type IntoIter = std::slice::Iter<'a, RelayAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for AddressSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.order.iter())
    }
}

#[cfg(test)]
pub(crate) fn addr(s: &str) -> RelayAddress {
    s.parse().unwrap()
}

#[cfg(test)]
pub(crate) fn set(items: &[&str]) -> AddressSet {
    items.iter().map(|s| addr(s)).collect()
}
