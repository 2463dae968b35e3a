use std::net::IpAddr;

use ipnet::IpNet;

use crate::core::config::AccessConfig;

/// Static allow/block rule set, built once at startup and shared read-only.
///
/// Evaluation order is block-list first, then default-deny against the
/// allow-list: an address inside an allowed network is still rejected when it
/// appears in the block-list, and an address matching no allowed network is
/// rejected regardless of the block-list.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed_networks: Vec<IpNet>,
    blocked_addresses: Vec<IpAddr>,
}

impl AccessPolicy {
    /// Parse the configured rules. Malformed entries refuse startup rather
    /// than silently shrinking the rule set.
    pub fn from_config(config: &AccessConfig) -> Result<Self, String> {
        let allowed_networks = config
            .allowed_networks
            .iter()
            .map(|raw| {
                raw.parse::<IpNet>()
                    .map_err(|e| format!("Invalid network '{}' in ALLOWED_NETWORKS: {}", raw, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let blocked_addresses = config
            .blocked_addresses
            .iter()
            .map(|raw| {
                raw.parse::<IpAddr>()
                    .map_err(|e| format!("Invalid address '{}' in BLOCKED_IPS: {}", raw, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_networks,
            blocked_addresses,
        })
    }

    pub fn permits(&self, addr: IpAddr) -> bool {
        if self.blocked_addresses.contains(&addr) {
            return false;
        }

        self.allowed_networks.iter().any(|net| net.contains(&addr))
    }

    pub fn allowed_network_count(&self) -> usize {
        self.allowed_networks.len()
    }

    pub fn blocked_address_count(&self) -> usize {
        self.blocked_addresses.len()
    }
}
