//! VNFeed Core — the connector building blocks.
//!
//! This crate contains everything a single sync is assembled from:
//! - Flat records and cursor markers
//! - The blocking HTTP transport seam
//! - Parent listers (organization listing, symbol file)
//! - Per-ticker fetch connectors (overview, price history, intraday,
//!   financial statements, analyst ratings)
//! - The per-identifier incremental cursor tracker
//! - Connector configuration and window resolution

pub mod config;
pub mod connectors;
pub mod cursor;
pub mod error;
pub mod lister;
pub mod record;
pub mod transport;

pub use config::{ConnectorConfig, ErrorPolicy, Frequency, SyncWindow};
pub use cursor::{CursorState, CursorTracker};
pub use error::{ConfigError, FetchError};
pub use record::{Marker, Record};
pub use transport::{HeaderSet, HttpTransport, Transport};
