//! IP allow-list for control access

use std::{net::IpAddr, path::Path};
use tracing::{info, warn};

use super::Access;
use crate::error::AllowListError;

/// Entries that are always allowed, merged ahead of any file entries.
pub const BUILTIN_ALLOW_LIST: &[&str] = &["127.0.0.1", "::1"];

/// A single parsed allow-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowEntry {
    Address(IpAddr),
    Network { base: IpAddr, prefix: u8 },
}

impl AllowEntry {
    /// Parse an address (`10.0.0.7`) or a CIDR range (`10.0.0.0/24`).
    ///
    /// Host bits set in a CIDR base are ignored, so `10.0.0.7/24` covers the
    /// same range as `10.0.0.0/24`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        match entry.split_once('/') {
            Some((addr, prefix)) => {
                let base = addr.trim().parse::<IpAddr>().ok()?.to_canonical();
                let prefix = prefix.trim().parse::<u8>().ok()?;
                let max = match base {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                (prefix <= max).then_some(AllowEntry::Network { base, prefix })
            }
            None => entry.parse::<IpAddr>().ok().map(|ip| AllowEntry::Address(ip.to_canonical())),
        }
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        match *self {
            AllowEntry::Address(addr) => addr == ip,
            AllowEntry::Network { base, prefix } => match (base, ip) {
                (IpAddr::V4(base), IpAddr::V4(ip)) => {
                    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
                    u32::from(base) & mask == u32::from(ip) & mask
                }
                (IpAddr::V6(base), IpAddr::V6(ip)) => {
                    let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
                    u128::from(base) & mask == u128::from(ip) & mask
                }
                _ => false,
            },
        }
    }

    /// Number of addresses covered, saturating for very large IPv6 ranges.
    pub fn size(&self) -> u128 {
        match *self {
            AllowEntry::Address(_) => 1,
            AllowEntry::Network { base: IpAddr::V4(_), prefix } => 1u128 << (32 - u32::from(prefix)),
            AllowEntry::Network { base: IpAddr::V6(_), prefix } => {
                1u128.checked_shl(128 - u32::from(prefix)).unwrap_or(u128::MAX)
            }
        }
    }
}

/// Allow-list as configured, with the raw entries kept for reporting.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    raw: Vec<String>,
    parsed: Vec<AllowEntry>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = entries.into_iter().map(Into::into).collect();
        let parsed = raw.iter().filter_map(|e| AllowEntry::parse(e)).collect();
        Self { raw, parsed }
    }

    /// Read a JSON array of entries from `path`.
    pub fn read_file(path: &Path) -> Result<Vec<String>, AllowListError> {
        let contents = std::fs::read_to_string(path).map_err(|source| AllowListError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| AllowListError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Built-in entries merged with the entries from `path`.
    ///
    /// A missing file is not an error. An unreadable or malformed file is
    /// logged and ignored.
    pub fn load(path: &Path) -> Self {
        let mut entries: Vec<String> = BUILTIN_ALLOW_LIST.iter().map(|e| e.to_string()).collect();

        if path.exists() {
            match Self::read_file(path) {
                Ok(file_entries) => {
                    info!("Loaded {} allow-list entries from {}", file_entries.len(), path.display());
                    entries.extend(file_entries);
                }
                Err(e) => warn!("Ignoring allow-list file: {}", e),
            }
        }

        Self::new(entries)
    }

    /// Raw entries in configuration order, including invalid ones.
    pub fn entries(&self) -> &[String] {
        &self.raw
    }

    pub fn is_allowed(&self, ip: &str) -> bool {
        match ip.trim().parse::<IpAddr>() {
            Ok(ip) => self.parsed.iter().any(|entry| entry.contains(ip)),
            Err(_) => false,
        }
    }

    /// Authorization decision for a caller identity.
    pub fn check(&self, ip: &str) -> Access {
        Access::from_allowed(self.is_allowed(ip))
    }

    /// Log every configured entry at startup.
    pub fn log_summary(&self) {
        info!("Control access configured for:");
        for (i, entry) in self.raw.iter().enumerate() {
            match AllowEntry::parse(entry) {
                Some(parsed @ AllowEntry::Network { .. }) => {
                    info!("  {}. Subnet: {} ({} addresses)", i + 1, entry, parsed.size())
                }
                Some(AllowEntry::Address(_)) => info!("  {}. IP: {}", i + 1, entry),
                None => warn!("  {}. Invalid entry (ignored): {}", i + 1, entry),
            }
        }
        info!("Total parsed allow-list entries: {}", self.parsed.len());
    }
}
