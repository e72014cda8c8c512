use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard `{success, errors, result}` envelope wrapping every v4 response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: u64,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
pub struct CfZone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CfRecord {
    pub id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub priority: Option<u16>,
}

/// Request body for record creation and full-record updates.
#[derive(Debug, Serialize)]
pub struct CfRecordPayload<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub content: &'a str,
    pub ttl: u32,
    pub proxied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parsing() {
        let json = r#"{
            "success": true,
            "errors": [],
            "messages": [],
            "result": {
                "id": "abc123",
                "zone_id": "z1",
                "zone_name": "example.com",
                "type": "A",
                "name": "www.example.com",
                "content": "192.0.2.1",
                "proxied": true,
                "ttl": 300
            }
        }"#;

        let envelope: ApiEnvelope<CfRecord> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert!(envelope.errors.is_empty());
        let record = envelope.result.unwrap();
        assert_eq!(record.record_type, "A");
        assert_eq!(record.name, "www.example.com");
    }

    #[test]
    fn envelope_error_parsing() {
        let json = r#"{
            "success": false,
            "errors": [{"code": 6003, "message": "Invalid request headers"}],
            "result": null
        }"#;
        let envelope: ApiEnvelope<CfRecord> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(
            envelope.errors[0].to_string(),
            "[6003] Invalid request headers"
        );
    }
}
