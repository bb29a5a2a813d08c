//! Connection pre-flight check.
//!
//! Validates the configuration and optionally issues one cheap probe
//! request against the listing endpoint. The check never returns an error
//! to the caller — failures are values with a human-readable diagnostic,
//! which is what the downstream framework displays.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vnfeed_core::config::ConnectorConfig;
use vnfeed_core::lister::{Lister, OrganizationLister, SymbolFileLister};
use vnfeed_core::transport::Transport;

/// Result of the connection check, in the boolean-plus-message shape the
/// downstream framework expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub success: bool,
    pub message: String,
}

impl CheckOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            message: "connection check passed".into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Validate `config`, probing the listing endpoint when a transport is
/// supplied. Pass `None` for a configuration-only check.
pub fn check_connection(
    config: &ConnectorConfig,
    transport: Option<&dyn Transport>,
) -> CheckOutcome {
    if let Err(e) = config.validate() {
        return CheckOutcome::fail(e.to_string());
    }

    if let Some(transport) = transport {
        // One cheap request against whichever listing this config targets.
        let lister: Box<dyn Lister> = match &config.symbol_url {
            Some(url) => Box::new(SymbolFileLister::new(url.clone(), Some(1))),
            None => Box::new(OrganizationLister::new(Some(1))),
        };
        debug!(lister = lister.name(), "probing listing endpoint");
        if let Err(e) = lister.list(transport) {
            return CheckOutcome::fail(format!("probe of {} failed: {e}", lister.name()));
        }
    }

    CheckOutcome::ok()
}
