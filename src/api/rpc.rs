//! Machine RPC surface: one `{method, params}` endpoint mirroring the record
//! operations, answering `{result}` or `{error: {code, message}}`.

use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::SharedState;
use crate::auth::Authenticated;
use crate::dns::RecordInput;
use crate::error::DnsError;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize)]
struct ZoneParams {
    zone: String,
}

#[derive(Debug, Deserialize)]
struct RecordNameParams {
    zone: String,
    name: String,
}

pub async fn dispatch(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Json(request): Json<RpcRequest>,
) -> Result<Json<Value>, DnsError> {
    let dns = &state.dns;

    let result = match request.method.as_str() {
        "zones.list" => to_value(dns.list_zones().await?)?,
        "records.list" => {
            let p: ZoneParams = params(request.params)?;
            to_value(dns.list_records(&p.zone).await?)?
        }
        "records.get" => {
            let p: RecordNameParams = params(request.params)?;
            to_value(dns.get_record(&p.zone, &p.name).await?)?
        }
        "records.create" => {
            let input: RecordInput = params(request.params)?;
            to_value(dns.create_record(&input).await?)?
        }
        "records.update" => {
            let input: RecordInput = params(request.params)?;
            to_value(dns.update_record(&input).await?)?
        }
        "records.upsert" => {
            let input: RecordInput = params(request.params)?;
            to_value(dns.upsert_record(&input).await?)?
        }
        "records.delete" => {
            let p: RecordNameParams = params(request.params)?;
            dns.delete_record(&p.zone, &p.name).await?;
            json!({ "deleted": true })
        }
        other => return Err(DnsError::bad_request(format!("unknown method: {other}"))),
    };

    Ok(Json(json!({ "result": result })))
}

fn params<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, DnsError> {
    serde_json::from_value(value)
        .map_err(|err| DnsError::bad_request(format!("invalid params: {err}")))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, DnsError> {
    serde_json::to_value(value).map_err(|err| DnsError::Backend(err.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::AppState;
    use crate::config::{AppConfig, RecordDefaults};
    use crate::dns::DnsService;
    use crate::dns::testutil::MockBackend;
    use crate::store::ConfigStore;
    use tempfile::TempDir;

    fn state() -> (TempDir, SharedState) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ConfigStore::open(dir.path()).unwrap());
        let dns = Arc::new(DnsService::new(
            Arc::new(MockBackend::with_zone("z1", "example.com")),
            RecordDefaults::default(),
        ));
        let state = Arc::new(AppState {
            config: AppConfig {
                telegram_token: "test".into(),
                cloudflare_token: "test".into(),
                allowed_users: Vec::new(),
                http_timeout: Duration::from_secs(5),
            },
            store,
            dns,
        });
        (dir, state)
    }

    async fn call(state: &SharedState, method: &str, params: Value) -> Result<Value, DnsError> {
        let request = RpcRequest {
            method: method.to_string(),
            params,
        };
        dispatch(Authenticated, Extension(Arc::clone(state)), Json(request))
            .await
            .map(|Json(body)| body)
    }

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let (_dir, state) = state();

        let created = call(
            &state,
            "records.create",
            json!({
                "zone": "example.com",
                "name": "www",
                "type": "A",
                "content": "192.168.1.1",
                "ttl": 0,
                "proxied": true
            }),
        )
        .await
        .unwrap();
        assert_eq!(created["result"]["name"], "www.example.com");
        assert_eq!(created["result"]["ttl"], 300);

        let fetched = call(
            &state,
            "records.get",
            json!({ "zone": "example.com", "name": "www" }),
        )
        .await
        .unwrap();
        assert_eq!(fetched["result"]["content"], "192.168.1.1");
    }

    #[tokio::test]
    async fn duplicate_create_maps_to_duplicate_error() {
        let (_dir, state) = state();
        let params = json!({
            "zone": "example.com",
            "name": "www",
            "type": "A",
            "content": "192.168.1.1"
        });

        call(&state, "records.create", params.clone()).await.unwrap();
        let err = call(&state, "records.create", params).await.unwrap_err();
        assert_eq!(err.code(), "duplicate_record");
    }

    #[tokio::test]
    async fn delete_and_unknown_method() {
        let (_dir, state) = state();
        call(
            &state,
            "records.create",
            json!({
                "zone": "example.com",
                "name": "www",
                "type": "A",
                "content": "192.168.1.1"
            }),
        )
        .await
        .unwrap();

        let deleted = call(
            &state,
            "records.delete",
            json!({ "zone": "example.com", "name": "www" }),
        )
        .await
        .unwrap();
        assert_eq!(deleted["result"]["deleted"], true);

        let err = call(&state, "nope", json!({})).await.unwrap_err();
        assert_eq!(err.code(), "bad_request");
    }

    #[tokio::test]
    async fn malformed_params_are_a_bad_request() {
        let (_dir, state) = state();
        let err = call(&state, "records.list", json!({ "zoop": 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "bad_request");
    }

    #[tokio::test]
    async fn zones_list_returns_configured_zone() {
        let (_dir, state) = state();
        let zones = call(&state, "zones.list", json!({})).await.unwrap();
        assert_eq!(zones["result"][0]["name"], "example.com");
    }
}
