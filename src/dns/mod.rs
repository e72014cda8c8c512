pub mod backend;
pub mod service;
pub mod types;

#[cfg(test)]
pub mod testutil;

pub use backend::RecordBackend;
pub use service::{DnsService, ensure_fully_qualified};
pub use types::{DnsRecord, RecordFilter, RecordInput, RecordPayload, RecordType, Zone};
