//! Record Backend abstraction.
//!
//! The bot and the RPC surface never talk to the provider directly; they go
//! through [`DnsService`](super::DnsService), which drives this trait. The
//! Cloudflare implementation lives in [`crate::cloudflare`].

use async_trait::async_trait;

use super::types::{DnsRecord, RecordFilter, RecordPayload, Zone};
use crate::error::DnsError;

/// CRUD surface of the DNS provider, keyed by opaque zone/record IDs.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError>;

    /// Resolve a zone name to its backend identifier.
    async fn zone_by_name(&self, name: &str) -> Result<Zone, DnsError>;

    async fn list_records(
        &self,
        zone_id: &str,
        filter: RecordFilter,
    ) -> Result<Vec<DnsRecord>, DnsError>;

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, DnsError>;

    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError>;

    /// Full-record replacement; the backend has no partial-patch contract.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError>;

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), DnsError>;
}
