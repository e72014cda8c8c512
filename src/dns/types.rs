use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Record types supported on the Cloudflare free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
}

impl RecordType {
    pub const ALL: [RecordType; 8] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Txt,
        RecordType::Ns,
        RecordType::Srv,
        RecordType::Caa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported record type: {0}")]
pub struct UnknownRecordType(pub String);

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            "NS" => Ok(RecordType::Ns),
            "SRV" => Ok(RecordType::Srv),
            "CAA" => Ok(RecordType::Caa),
            _ => Err(UnknownRecordType(s.to_string())),
        }
    }
}

/// A DNS zone under the provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A single DNS resource record, as returned by the Record Backend.
///
/// Never cached beyond a single render; every interaction re-fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} (TTL: {}, Proxied: {})",
            self.record_type, self.name, self.content, self.ttl, self.proxied
        )
    }
}

/// Filters applied when listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub name: Option<String>,
    pub record_type: Option<RecordType>,
}

/// Caller-supplied record description for create/update/upsert.
///
/// The type is kept as a string so that validation failures surface as
/// `InvalidRecord` instead of a deserialization error. A TTL of `0` means
/// "use the configured default".
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInput {
    pub zone: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub priority: Option<u16>,
}

/// Validated, fully-qualified record data handed to the Record Backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPayload {
    pub name: String,
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    pub priority: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_round_trip() {
        for rt in RecordType::ALL {
            assert_eq!(rt.as_str().parse::<RecordType>().unwrap(), rt);
        }
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("PTR".parse::<RecordType>().is_err());
        assert!("".parse::<RecordType>().is_err());
    }

    #[test]
    fn record_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&RecordType::Cname).unwrap(),
            "\"CNAME\""
        );
    }

    #[test]
    fn dns_record_display() {
        let record = DnsRecord {
            id: "abc123".to_string(),
            zone_id: "z1".to_string(),
            zone_name: "example.com".to_string(),
            name: "www.example.com".to_string(),
            record_type: RecordType::A,
            content: "192.0.2.1".to_string(),
            ttl: 300,
            proxied: true,
            priority: None,
        };
        let s = record.to_string();
        assert!(s.contains("www.example.com"));
        assert!(s.contains("192.0.2.1"));
    }
}
