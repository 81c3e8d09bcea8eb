use std::collections::HashMap;

use crate::{Platform, ReconcileError, ReconciliationDecision, RelayAddress};

const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Command templates for one platform. Templates contain `{address}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub add_template: String,
    pub remove_template: String,
    /// Saves the running configuration after a session.
    pub save_command: String,
}

impl Dialect {
    fn new(add_template: &str, remove_template: &str, save_command: &str) -> Self {
        Dialect {
            add_template: add_template.to_string(),
            remove_template: remove_template.to_string(),
            save_command: save_command.to_string(),
        }
    }

    pub fn add(&self, addr: &RelayAddress) -> String {
        self.add_template
            .replace(ADDRESS_PLACEHOLDER, &addr.to_string())
    }

    pub fn remove(&self, addr: &RelayAddress) -> String {
        self.remove_template
            .replace(ADDRESS_PLACEHOLDER, &addr.to_string())
    }
}

/// Maps each platform to its relay command dialect.
#[derive(Debug, Clone)]
pub struct DialectTable {
    dialects: HashMap<Platform, Dialect>,
}

impl DialectTable {
    /// The Cisco dialects for every supported platform.
    pub fn standard() -> Self {
        let ios = Dialect::new(
            "ip helper-address {address}",
            "no ip helper-address {address}",
            "copy running-config startup-config",
        );
        let nxos = Dialect::new(
            "ip dhcp relay address {address}",
            "no ip dhcp relay address {address}",
            "copy running-config startup-config",
        );
        let asa = Dialect::new(
            "dhcprelay server {address}",
            "no dhcprelay server {address}",
            "write memory",
        );

        DialectTable::from_entries([
            (Platform::Ios, ios.clone()),
            (Platform::IosXe, ios),
            (Platform::Nxos, nxos),
            (Platform::Asa, asa),
        ])
    }

    pub fn from_entries<I: IntoIterator<Item = (Platform, Dialect)>>(entries: I) -> Self {
        DialectTable {
            dialects: entries.into_iter().collect(),
        }
    }

    /// Check that every platform has a dialect with usable templates.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        for platform in Platform::ALL {
            let dialect = self.dialect(platform)?;
            if !dialect.add_template.contains(ADDRESS_PLACEHOLDER)
                || !dialect.remove_template.contains(ADDRESS_PLACEHOLDER)
            {
                return Err(ReconcileError::UnsupportedPlatform(format!(
                    "{} (template without {})",
                    platform, ADDRESS_PLACEHOLDER
                )));
            }
        }
        Ok(())
    }

    pub fn dialect(&self, platform: Platform) -> Result<&Dialect, ReconcileError> {
        self.dialects
            .get(&platform)
            .ok_or_else(|| ReconcileError::UnsupportedPlatform(platform.to_string()))
    }

    /// Render a decision into interface-scoped commands, removals first.
    pub fn render(
        &self,
        decision: &ReconciliationDecision,
        platform: Platform,
    ) -> Result<Vec<String>, ReconcileError> {
        let dialect = self.dialect(platform)?;
        let removals = decision.to_remove.iter().map(|a| dialect.remove(a));
        let additions = decision.to_add.iter().map(|a| dialect.add(a));
        Ok(removals.chain(additions).collect())
    }
}

impl Default for DialectTable {
    fn default() -> Self {
        DialectTable::standard()
    }
}
