//! Thin orchestration of record CRUD over the Record Backend.
//!
//! All name handling funnels through [`ensure_fully_qualified`], applied on
//! both the read and the write path so lookups and writes agree on the key.

use std::sync::Arc;

use tracing::debug;

use super::backend::RecordBackend;
use super::types::{DnsRecord, RecordFilter, RecordInput, RecordPayload, RecordType, Zone};
use crate::config::RecordDefaults;
use crate::error::DnsError;

pub struct DnsService {
    backend: Arc<dyn RecordBackend>,
    defaults: RecordDefaults,
}

impl DnsService {
    pub fn new(backend: Arc<dyn RecordBackend>, defaults: RecordDefaults) -> Self {
        Self { backend, defaults }
    }

    pub async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        self.backend.list_zones().await
    }

    pub async fn list_records(&self, zone_name: &str) -> Result<Vec<DnsRecord>, DnsError> {
        let zone = self.backend.zone_by_name(zone_name).await?;
        let records = self
            .backend
            .list_records(&zone.id, RecordFilter::default())
            .await?;
        debug!("listed {} record(s) in {}", records.len(), zone.name);
        Ok(records)
    }

    pub async fn get_record(
        &self,
        zone_name: &str,
        record_name: &str,
    ) -> Result<DnsRecord, DnsError> {
        let zone = self.backend.zone_by_name(zone_name).await?;
        let full_name = ensure_fully_qualified(record_name, &zone.name);
        self.find_by_name(&zone.id, &full_name).await
    }

    pub async fn create_record(&self, input: &RecordInput) -> Result<DnsRecord, DnsError> {
        let record_type = parse_record_type(&input.record_type)?;
        let zone = self.backend.zone_by_name(&input.zone).await?;
        let full_name = ensure_fully_qualified(&input.name, &zone.name);

        // The backend does not enforce name uniqueness; we do.
        match self.find_by_name(&zone.id, &full_name).await {
            Ok(_) => return Err(DnsError::DuplicateRecord(full_name)),
            Err(DnsError::RecordNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let payload = self.payload(input, record_type, full_name);
        let created = self.backend.create_record(&zone.id, &payload).await?;
        debug!("created {created}");
        Ok(created)
    }

    pub async fn update_record(&self, input: &RecordInput) -> Result<DnsRecord, DnsError> {
        let record_type = parse_record_type(&input.record_type)?;
        let zone = self.backend.zone_by_name(&input.zone).await?;
        let full_name = ensure_fully_qualified(&input.name, &zone.name);

        let existing = self.find_by_name(&zone.id, &full_name).await?;
        let payload = self.payload(input, record_type, full_name);
        let updated = self
            .backend
            .update_record(&zone.id, &existing.id, &payload)
            .await?;
        debug!("updated {updated}");
        Ok(updated)
    }

    pub async fn delete_record(&self, zone_name: &str, record_name: &str) -> Result<(), DnsError> {
        let zone = self.backend.zone_by_name(zone_name).await?;
        let full_name = ensure_fully_qualified(record_name, &zone.name);
        let record = self.find_by_name(&zone.id, &full_name).await?;
        self.backend.delete_record(&zone.id, &record.id).await?;
        debug!("deleted {full_name}");
        Ok(())
    }

    /// Create-or-update keyed by the qualified name; safe to call repeatedly
    /// with the same logical record.
    pub async fn upsert_record(&self, input: &RecordInput) -> Result<DnsRecord, DnsError> {
        let record_type = parse_record_type(&input.record_type)?;
        let zone = self.backend.zone_by_name(&input.zone).await?;
        let full_name = ensure_fully_qualified(&input.name, &zone.name);

        let existing = match self.find_by_name(&zone.id, &full_name).await {
            Ok(record) => Some(record),
            Err(DnsError::RecordNotFound(_)) => None,
            Err(err) => return Err(err),
        };

        let payload = self.payload(input, record_type, full_name);
        match existing {
            Some(record) => {
                self.backend
                    .update_record(&zone.id, &record.id, &payload)
                    .await
            }
            None => self.backend.create_record(&zone.id, &payload).await,
        }
    }

    async fn find_by_name(&self, zone_id: &str, full_name: &str) -> Result<DnsRecord, DnsError> {
        let filter = RecordFilter {
            name: Some(full_name.to_string()),
            ..RecordFilter::default()
        };
        let records = self.backend.list_records(zone_id, filter).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| DnsError::RecordNotFound(full_name.to_string()))
    }

    fn payload(
        &self,
        input: &RecordInput,
        record_type: RecordType,
        full_name: String,
    ) -> RecordPayload {
        let ttl = if input.ttl == 0 {
            self.defaults.ttl
        } else {
            input.ttl
        };
        RecordPayload {
            name: full_name,
            record_type,
            content: input.content.clone(),
            ttl,
            proxied: input.proxied,
            priority: input.priority,
        }
    }
}

fn parse_record_type(raw: &str) -> Result<RecordType, DnsError> {
    raw.parse::<RecordType>()
        .map_err(|err| DnsError::InvalidRecord(err.to_string()))
}

/// Qualify `name` relative to `zone_name`.
///
/// Idempotent by construction: a name that already ends with the zone name is
/// returned unchanged, so applying this twice equals applying it once. `@`
/// and the empty string address the zone apex.
pub fn ensure_fully_qualified(name: &str, zone_name: &str) -> String {
    if !name.is_empty() && name.ends_with(zone_name) {
        return name.to_string();
    }
    if name.is_empty() || name == "@" {
        return zone_name.to_string();
    }
    format!("{name}.{zone_name}")
}

#[cfg(test)]
mod tests {
    use super::super::testutil::MockBackend;
    use super::*;

    fn service(backend: MockBackend) -> DnsService {
        DnsService::new(Arc::new(backend), RecordDefaults::default())
    }

    fn input(zone: &str, name: &str, rtype: &str, content: &str) -> RecordInput {
        RecordInput {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type: rtype.to_string(),
            content: content.to_string(),
            ttl: 0,
            proxied: true,
            priority: None,
        }
    }

    #[test]
    fn fully_qualified_is_idempotent() {
        let cases = [
            ("www", "example.com"),
            ("www.example.com", "example.com"),
            ("@", "example.com"),
            ("", "example.com"),
            ("*.api", "example.com"),
        ];
        for (name, zone) in cases {
            let once = ensure_fully_qualified(name, zone);
            let twice = ensure_fully_qualified(&once, zone);
            assert_eq!(once, twice, "not idempotent for ({name}, {zone})");
        }
    }

    #[test]
    fn fully_qualified_cases() {
        assert_eq!(
            ensure_fully_qualified("www", "example.com"),
            "www.example.com"
        );
        assert_eq!(ensure_fully_qualified("@", "example.com"), "example.com");
        assert_eq!(ensure_fully_qualified("", "example.com"), "example.com");
        assert_eq!(
            ensure_fully_qualified("www.example.com", "example.com"),
            "www.example.com"
        );
    }

    #[tokio::test]
    async fn create_fills_defaults_and_qualifies_name() {
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        let created = svc
            .create_record(&input("example.com", "www", "A", "192.168.1.1"))
            .await
            .unwrap();
        assert_eq!(created.name, "www.example.com");
        assert_eq!(created.ttl, 300);
        assert!(created.proxied);
    }

    #[tokio::test]
    async fn create_twice_is_a_duplicate() {
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        let req = input("example.com", "www", "A", "192.168.1.1");
        svc.create_record(&req).await.unwrap();
        let err = svc.create_record(&req).await.unwrap_err();
        assert!(matches!(err, DnsError::DuplicateRecord(name) if name == "www.example.com"));
    }

    #[tokio::test]
    async fn upsert_twice_leaves_one_record() {
        let backend = MockBackend::with_zone("z1", "example.com");
        let svc = DnsService::new(
            Arc::new(backend),
            RecordDefaults {
                ttl: 300,
                proxied: true,
            },
        );
        let mut req = input("example.com", "www", "A", "192.168.1.1");
        svc.upsert_record(&req).await.unwrap();
        req.content = "192.168.1.2".to_string();
        let updated = svc.upsert_record(&req).await.unwrap();

        let records = svc.list_records("example.com").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "192.168.1.2");
        assert_eq!(updated.content, "192.168.1.2");
    }

    #[tokio::test]
    async fn invalid_type_is_rejected_before_any_backend_call() {
        // The zone does not exist; an InvalidRecord (not ZoneNotFound) proves
        // validation ran first.
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        let err = svc
            .create_record(&input("missing.org", "www", "PTR", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DnsError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn unknown_zone_and_record_errors() {
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        let err = svc.list_records("missing.org").await.unwrap_err();
        assert!(matches!(err, DnsError::ZoneNotFound(_)));

        let err = svc.get_record("example.com", "nope").await.unwrap_err();
        assert!(matches!(err, DnsError::RecordNotFound(name) if name == "nope.example.com"));
    }

    #[tokio::test]
    async fn update_replaces_single_record_in_place() {
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        let created = svc
            .create_record(&input("example.com", "www", "A", "192.168.1.1"))
            .await
            .unwrap();

        let mut req = input("example.com", "www", "A", "10.0.0.1");
        req.ttl = 600;
        req.proxied = false;
        let updated = svc.update_record(&req).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content, "10.0.0.1");
        assert_eq!(updated.ttl, 600);
        assert!(!updated.proxied);
    }

    #[tokio::test]
    async fn delete_then_lookup_fails() {
        let svc = service(MockBackend::with_zone("z1", "example.com"));
        svc.create_record(&input("example.com", "www", "A", "192.168.1.1"))
            .await
            .unwrap();
        svc.delete_record("example.com", "www").await.unwrap();
        let err = svc.get_record("example.com", "www").await.unwrap_err();
        assert!(matches!(err, DnsError::RecordNotFound(_)));
    }
}
