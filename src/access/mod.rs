//! Control access module
//!
//! Decides whether a caller may control the timer, based on its network
//! address and the configured allow-list.

pub mod allow_list;
pub mod client_ip;

pub use allow_list::{AllowEntry, AllowList, BUILTIN_ALLOW_LIST};
pub use client_ip::client_identity;

use crate::error::ControlError;

/// Authorization decision for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

impl Access {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed { Access::Granted } else { Access::Denied }
    }

    pub fn is_granted(self) -> bool {
        self == Access::Granted
    }

    /// Fail with [`ControlError::Unauthorized`] unless access was granted.
    pub fn require(self) -> Result<(), ControlError> {
        match self {
            Access::Granted => Ok(()),
            Access::Denied => Err(ControlError::Unauthorized),
        }
    }
}
