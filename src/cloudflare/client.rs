use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cloudflare::types::{ApiEnvelope, CfRecord, CfRecordPayload, CfZone};
use crate::dns::{DnsRecord, RecordBackend, RecordFilter, RecordPayload, RecordType, Zone};
use crate::error::DnsError;

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Clone)]
pub struct CloudflareClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(api_token: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("suzume/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            api_token: api_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_envelope<T: DeserializeOwned>(
        res: reqwest::Response,
        what: &str,
    ) -> Result<T, DnsError> {
        let status = res.status();
        let body: ApiEnvelope<T> = res
            .json()
            .await
            .map_err(|err| DnsError::Backend(anyhow!(err).context(format!("parse {what} response"))))?;

        if !body.success {
            if status == StatusCode::NOT_FOUND {
                return Err(DnsError::RecordNotFound(what.to_string()));
            }
            let messages = body
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(DnsError::Backend(anyhow!(
                "{what} failed with {status}: {messages}"
            )));
        }

        body.result
            .ok_or_else(|| DnsError::Backend(anyhow!("{what}: API returned success but no result")))
    }
}

fn transport(err: reqwest::Error) -> DnsError {
    DnsError::Backend(err.into())
}

/// Map a wire record into the domain model. Records whose type falls outside
/// the supported enumeration are dropped by the caller.
fn map_record(r: CfRecord) -> Option<DnsRecord> {
    let record_type = match r.record_type.parse::<RecordType>() {
        Ok(t) => t,
        Err(_) => {
            warn!("skipping record {} with unsupported type {}", r.name, r.record_type);
            return None;
        }
    };
    Some(DnsRecord {
        id: r.id,
        zone_id: r.zone_id,
        zone_name: r.zone_name,
        name: r.name,
        record_type,
        content: r.content,
        ttl: r.ttl,
        proxied: r.proxied,
        priority: r.priority,
    })
}

fn wire_payload(p: &RecordPayload) -> CfRecordPayload<'_> {
    CfRecordPayload {
        name: &p.name,
        record_type: p.record_type.as_str(),
        content: &p.content,
        ttl: p.ttl,
        proxied: p.proxied,
        priority: p.priority,
    }
}

#[async_trait]
impl RecordBackend for CloudflareClient {
    async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        let url = self.url("zones");
        debug!("GET {url}");
        let res = self
            .http
            .get(&url)
            .query(&[("per_page", "50")])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        let zones: Vec<CfZone> = Self::read_envelope(res, "list zones").await?;
        Ok(zones
            .into_iter()
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .collect())
    }

    async fn zone_by_name(&self, name: &str) -> Result<Zone, DnsError> {
        let url = self.url("zones");
        debug!("GET {url}?name={name}");
        let res = self
            .http
            .get(&url)
            .query(&[("name", name)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        let zones: Vec<CfZone> = Self::read_envelope(res, "look up zone").await?;
        zones
            .into_iter()
            .next()
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .ok_or_else(|| DnsError::ZoneNotFound(name.to_string()))
    }

    async fn list_records(
        &self,
        zone_id: &str,
        filter: RecordFilter,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        let url = self.url(&format!("zones/{zone_id}/dns_records"));
        debug!("GET {url}");
        let mut req = self
            .http
            .get(&url)
            .query(&[("per_page", "100")])
            .bearer_auth(&self.api_token);
        if let Some(name) = &filter.name {
            req = req.query(&[("name", name.as_str())]);
        }
        if let Some(record_type) = filter.record_type {
            req = req.query(&[("type", record_type.as_str())]);
        }

        let res = req.send().await.map_err(transport)?;
        let records: Vec<CfRecord> = Self::read_envelope(res, "list dns records").await?;
        Ok(records.into_iter().filter_map(map_record).collect())
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, DnsError> {
        let url = self.url(&format!("zones/{zone_id}/dns_records/{record_id}"));
        debug!("GET {url}");
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        let record: CfRecord = Self::read_envelope(res, "get dns record").await?;
        map_record(record)
            .ok_or_else(|| DnsError::Backend(anyhow!("record {record_id} has an unsupported type")))
    }

    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError> {
        let url = self.url(&format!("zones/{zone_id}/dns_records"));
        debug!("POST {url}");
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&wire_payload(payload))
            .send()
            .await
            .map_err(transport)?;
        let record: CfRecord = Self::read_envelope(res, "create dns record").await?;
        map_record(record)
            .ok_or_else(|| DnsError::Backend(anyhow!("created record has an unsupported type")))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, DnsError> {
        let url = self.url(&format!("zones/{zone_id}/dns_records/{record_id}"));
        debug!("PUT {url}");
        let res = self
            .http
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&wire_payload(payload))
            .send()
            .await
            .map_err(transport)?;
        let record: CfRecord = Self::read_envelope(res, "update dns record").await?;
        map_record(record)
            .ok_or_else(|| DnsError::Backend(anyhow!("updated record has an unsupported type")))
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), DnsError> {
        let url = self.url(&format!("zones/{zone_id}/dns_records/{record_id}"));
        debug!("DELETE {url}");
        let res = self
            .http
            .delete(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        let _: serde_json::Value = Self::read_envelope(res, "delete dns record").await?;
        Ok(())
    }
}
