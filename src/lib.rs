//! # porkbun-ddns
//!
//! Keeps DNS A records at Porkbun pointed at this machine's public IPv4
//! address, touching the registrar only when the address changed since the
//! last successful run.
//!
//! ## Pipeline
//!
//! 1. Load the config (credentials, domain, records).
//! 2. Resolve the public IPv4 address, or take `--ip`.
//! 3. Compare it with the cache file; stop if equal.
//! 4. For each record: delete matching A/ALIAS/CNAME records, create a fresh A record.
//! 5. Write the new IP to the cache.
//!
//! ## Usage
//!
//! ```bash
//! # Typically run from cron
//! porkbun-ddns /etc/porkbun-ddns/config.json /var/lib/porkbun-ddns/ip.cache
//!
//! # Skip IP detection
//! porkbun-ddns config.json ip.cache --ip 203.0.113.5 --debug
//! ```

pub mod cache;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod registrar;

pub use cache::IpCache;
pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, Result};
pub use reconciler::{ReconcileOutcome, Reconciler};
