//! Compare the resolved IP with the cache and converge registrar records.

use crate::cache::IpCache;
use crate::config::{RecordSpec, UpdateStrategy};
use crate::error::Result;
use crate::registrar::{DnsRecord, RecordType, Registrar};
use std::net::Ipv4Addr;

/// What one configured record went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub fqdn: String,
    /// Existing records removed before the create.
    pub deleted: usize,
    /// True when the record was rewritten in place instead of recreated.
    pub edited: bool,
    /// Status string reported by the registrar.
    pub status: String,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Cached IP already matches; nothing was touched.
    Unchanged { ip: Ipv4Addr },
    /// Every configured record now points at `ip` and the cache was rewritten.
    Updated {
        previous: Option<String>,
        ip: Ipv4Addr,
        records: Vec<RecordUpdate>,
    },
}

/// Drives one compare-then-converge pass for a domain.
pub struct Reconciler {
    registrar: Box<dyn Registrar>,
    cache: IpCache,
    domain: String,
    records: Vec<RecordSpec>,
    strategy: UpdateStrategy,
}

impl Reconciler {
    pub fn new(
        registrar: Box<dyn Registrar>,
        cache: IpCache,
        domain: String,
        records: Vec<RecordSpec>,
    ) -> Self {
        Self {
            registrar,
            cache,
            domain,
            records,
            strategy: UpdateStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bring every configured record to `ip` unless the cache says it already is.
    ///
    /// The cache is written only after all records succeed; the first error
    /// aborts the pass with the cache untouched.
    pub async fn run(&self, ip: Ipv4Addr) -> Result<ReconcileOutcome> {
        let ip_str = ip.to_string();
        let cached = self.cache.load()?;

        if cached.as_deref() == Some(ip_str.as_str()) {
            tracing::info!("IP unchanged ({}), no update needed.", ip);
            return Ok(ReconcileOutcome::Unchanged { ip });
        }

        tracing::info!(
            "IP has changed or first run. Old: {}, New: {}",
            cached.as_deref().unwrap_or("none"),
            ip
        );

        let mut updates = Vec::with_capacity(self.records.len());
        for spec in &self.records {
            let update = self.apply(spec, ip).await?;
            tracing::info!("{}: {}", update.fqdn, update.status);
            updates.push(update);
        }

        self.cache.save(&ip_str)?;

        Ok(ReconcileOutcome::Updated {
            previous: cached,
            ip,
            records: updates,
        })
    }

    async fn apply(&self, spec: &RecordSpec, ip: Ipv4Addr) -> Result<RecordUpdate> {
        let fqdn = spec.fqdn(&self.domain);
        let existing = self.existing(&fqdn).await?;

        if self.strategy == UpdateStrategy::Edit {
            if let [only] = existing.as_slice() {
                if only.record_type == RecordType::A {
                    let result = self
                        .registrar
                        .edit_record(&self.domain, &only.id, spec.subdomain(), ip)
                        .await?;
                    return Ok(RecordUpdate {
                        fqdn,
                        deleted: 0,
                        edited: true,
                        status: result.status,
                    });
                }
            }
            tracing::debug!("Cannot edit {} in place, recreating", fqdn);
        }

        tracing::debug!("Attempting to delete existing records for {}", fqdn);
        for record in &existing {
            tracing::debug!(
                "Deleting record ID {} of type {}",
                record.id,
                record.record_type
            );
            self.registrar.delete_record(&self.domain, &record.id).await?;
        }

        let result = self
            .registrar
            .create_record(&self.domain, spec.subdomain(), ip)
            .await?;

        Ok(RecordUpdate {
            fqdn,
            deleted: existing.len(),
            edited: false,
            status: result.status,
        })
    }

    /// Records at exactly `fqdn` that an A record would replace.
    async fn existing(&self, fqdn: &str) -> Result<Vec<DnsRecord>> {
        let records = self.registrar.list_records(&self.domain).await?;
        Ok(records
            .into_iter()
            .filter(|r| r.name == fqdn && r.record_type.is_replaceable())
            .collect())
    }
}
