//! In-memory Record Backend used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::backend::RecordBackend;
use super::types::{DnsRecord, RecordFilter, RecordPayload, Zone};
use crate::error::DnsError;

pub struct MockBackend {
    zones: Vec<Zone>,
    records: Mutex<Vec<DnsRecord>>,
    next_id: Mutex<u64>,
}

impl MockBackend {
    pub fn with_zone(id: &str, name: &str) -> Self {
        Self {
            zones: vec![Zone {
                id: id.to_string(),
                name: name.to_string(),
            }],
            records: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    fn fresh_id(&self) -> String {
        let mut n = self.next_id.lock().unwrap();
        let id = format!("rec{n}");
        *n += 1;
        id
    }
}

#[async_trait]
impl RecordBackend for MockBackend {
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        Ok(self.zones.clone())
    }

    async fn zone_by_name(&self, name: &str) -> Result<Zone, DnsError> {
        self.zones
            .iter()
            .find(|z| z.name == name)
            .cloned()
            .ok_or_else(|| DnsError::ZoneNotFound(name.to_string()))
    }

    async fn list_records(
        &self,
        zone_id: &str,
        filter: RecordFilter,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.zone_id == zone_id)
            .filter(|r| filter.name.as_deref().map_or(true, |n| r.name == n))
            .filter(|r| filter.record_type.map_or(true, |t| r.record_type == t))
            .cloned()
            .collect())
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, DnsError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.zone_id == zone_id && r.id == record_id)
            .cloned()
            .ok_or_else(|| DnsError::RecordNotFound(record_id.to_string()))
    }

    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError> {
        let zone = self
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .cloned()
            .ok_or_else(|| DnsError::ZoneNotFound(zone_id.to_string()))?;
        let record = DnsRecord {
            id: self.fresh_id(),
            zone_id: zone.id,
            zone_name: zone.name,
            name: payload.name.clone(),
            record_type: payload.record_type,
            content: payload.content.clone(),
            ttl: payload.ttl,
            proxied: payload.proxied,
            priority: payload.priority,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.zone_id == zone_id && r.id == record_id)
            .ok_or_else(|| DnsError::RecordNotFound(record_id.to_string()))?;
        record.name = payload.name.clone();
        record.record_type = payload.record_type;
        record.content = payload.content.clone();
        record.ttl = payload.ttl;
        record.proxied = payload.proxied;
        record.priority = payload.priority;
        Ok(record.clone())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), DnsError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !(r.zone_id == zone_id && r.id == record_id));
        if records.len() == before {
            return Err(DnsError::RecordNotFound(record_id.to_string()));
        }
        Ok(())
    }
}
