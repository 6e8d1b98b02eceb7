//! Typed inbound requests and the canonical bodies their signatures cover.
//!
//! Each `*Signed` struct declares fields in signing order; absent optionals
//! are skipped, never written as `null`.

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::domain::payload::FieldReader;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_crypto::{canonical_f64, canonical_opt_f64, canonicalize};
use shared_types::{BootstrapPointer, HeaderEntry, HeaderSnapshot, PeerRecord, StatsSnapshot};

/// Maximum headers accepted in one submission.
pub const MAX_HEADERS: usize = cw_02_snapshot_quorum::MAX_HEADERS;

/// Serialize a signed body, mapping the (unreachable in practice) encoder
/// failure to a 500.
pub fn signing_bytes<T: Serialize>(body: &T) -> ApiResult<Vec<u8>> {
    canonicalize(body).map_err(|e| {
        tracing::error!(error = %e, "canonical encoding failed");
        ApiError::misconfigured(codes::INTERNAL_ERROR)
    })
}

/// `|now - ts| <= max_skew`
pub fn within_skew(now: u64, ts: u64, max_skew: u64) -> bool {
    now.abs_diff(ts) <= max_skew
}

// =============================================================================
// ANNOUNCE
// =============================================================================

pub const ANNOUNCE_REQUIRED: [&str; 7] = [
    "port",
    "node_id",
    "public_key",
    "version",
    "height",
    "last_seen",
    "signature",
];

/// `POST /announce`
#[derive(Debug, Clone, PartialEq)]
pub struct AnnounceRequest {
    /// Self-reported address; blank or non-string means "use the client IP".
    pub ip: Option<String>,
    /// Range-checked after trust, so it is kept wide here.
    pub port: u64,
    pub node_id: String,
    pub public_key: String,
    pub version: String,
    pub height: u64,
    pub last_seen: u64,
    pub latency_ms: Option<f64>,
    pub stats_port: Option<u64>,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct AnnounceSigned<'a> {
    pub ip: &'a str,
    pub port: u64,
    pub node_id: &'a str,
    pub public_key: &'a str,
    pub version: &'a str,
    pub height: u64,
    pub last_seen: u64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "canonical_opt_f64"
    )]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_port: Option<u64>,
}

impl AnnounceRequest {
    pub fn read(r: &FieldReader) -> ApiResult<Self> {
        r.require_all(&ANNOUNCE_REQUIRED)?;

        let stats_port = r.opt_u64("stats_port")?;
        if stats_port.is_some_and(|p| p > u64::from(u16::MAX)) {
            return Err(ApiError::invalid("stats_port"));
        }

        Ok(Self {
            ip: r
                .str_if_string("ip")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            port: r.u64("port")?,
            node_id: r.string("node_id")?,
            public_key: r.string("public_key")?,
            version: r.string("version")?,
            height: r.u64("height")?,
            last_seen: r.u64("last_seen")?,
            latency_ms: r.opt_f64_or("latency_ms", "invalid_latency_ms")?,
            stats_port,
            signature: r.string("signature")?,
        })
    }

    /// Address the record is stored under.
    pub fn effective_ip<'a>(&'a self, client_ip: &'a str) -> &'a str {
        self.ip.as_deref().unwrap_or(client_ip)
    }

    pub fn signed<'a>(&'a self, client_ip: &'a str) -> AnnounceSigned<'a> {
        AnnounceSigned {
            ip: self.effective_ip(client_ip),
            port: self.port,
            node_id: &self.node_id,
            public_key: &self.public_key,
            version: &self.version,
            height: self.height,
            last_seen: self.last_seen,
            latency_ms: self.latency_ms,
            stats_port: self.stats_port,
        }
    }

    /// Build the registry record, rejecting ports outside `1..=65535`.
    pub fn into_record(self, client_ip: &str) -> ApiResult<PeerRecord> {
        let port = u16::try_from(self.port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ApiError::bad_request(codes::INVALID_PORT))?;
        let ip = self.effective_ip(client_ip).to_string();

        Ok(PeerRecord {
            ip,
            port,
            node_id: self.node_id,
            version: self.version,
            height: self.height,
            last_seen: self.last_seen,
            first_seen: None,
            seen_count: None,
            stats_port: self.stats_port.and_then(|p| u16::try_from(p).ok()),
            latency_ms: self.latency_ms,
            signature: self.signature,
        })
    }
}

// =============================================================================
// HEADERS
// =============================================================================

pub const HEADERS_REQUIRED: [&str; 6] = [
    "height",
    "last_block_time",
    "headers",
    "node_id",
    "public_key",
    "signature",
];

/// `POST /headers`
#[derive(Debug, Clone, PartialEq)]
pub struct HeadersRequest {
    pub height: u64,
    /// Empty strings are treated as absent.
    pub network_id: Option<String>,
    pub last_block_time: u64,
    pub difficulty: Option<f64>,
    pub hashrate_ths: Option<f64>,
    pub headers: Vec<HeaderEntry>,
    pub node_id: String,
    pub public_key: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct HeadersSigned<'a> {
    pub height: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<&'a str>,
    pub last_block_time: u64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "canonical_opt_f64"
    )]
    pub difficulty: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "canonical_opt_f64"
    )]
    pub hashrate_ths: Option<f64>,
    pub headers: &'a [HeaderEntry],
    pub node_id: &'a str,
    pub public_key: &'a str,
}

impl HeadersRequest {
    /// Required fields and the header array. `difficulty` and
    /// `hashrate_ths` are read afterwards by [`Self::read_metrics`].
    pub fn read(r: &FieldReader) -> ApiResult<Self> {
        r.require_all(&HEADERS_REQUIRED)?;
        let headers = read_headers(r.require("headers")?)?;

        Ok(Self {
            height: r.u64("height")?,
            network_id: r.opt_string("network_id")?.filter(|s| !s.is_empty()),
            last_block_time: r.u64("last_block_time")?,
            difficulty: None,
            hashrate_ths: None,
            headers,
            node_id: r.string("node_id")?,
            public_key: r.string("public_key")?,
            signature: r.string("signature")?,
        })
    }

    pub fn read_metrics(&mut self, r: &FieldReader) -> ApiResult<()> {
        self.difficulty = r.opt_f64_or("difficulty", codes::INVALID_DIFFICULTY)?;
        self.hashrate_ths = r.opt_f64_or("hashrate_ths", codes::INVALID_HASHRATE)?;
        Ok(())
    }

    pub fn signed(&self) -> HeadersSigned<'_> {
        HeadersSigned {
            height: self.height,
            network_id: self.network_id.as_deref(),
            last_block_time: self.last_block_time,
            difficulty: self.difficulty,
            hashrate_ths: self.hashrate_ths,
            headers: &self.headers,
            node_id: &self.node_id,
            public_key: &self.public_key,
        }
    }

    pub fn into_snapshot(self, received_at: u64) -> HeaderSnapshot {
        HeaderSnapshot {
            height: self.height,
            network_id: self.network_id,
            last_block_time: self.last_block_time,
            difficulty: self.difficulty,
            hashrate_ths: self.hashrate_ths,
            headers: self.headers,
            node_id: self.node_id,
            public_key: self.public_key,
            signature: self.signature,
            received_at,
        }
    }
}

fn read_headers(value: &Value) -> ApiResult<Vec<HeaderEntry>> {
    let entries = value
        .as_array()
        .filter(|a| !a.is_empty() && a.len() <= MAX_HEADERS)
        .ok_or_else(|| ApiError::bad_request(codes::INVALID_HEADERS))?;

    entries
        .iter()
        .map(|entry| {
            HeaderEntry::deserialize(entry)
                .map_err(|_| ApiError::bad_request(codes::INVALID_HEADERS))
        })
        .collect()
}

// =============================================================================
// STATS
// =============================================================================

pub const STATS_REQUIRED: [&str; 10] = [
    "node_id",
    "public_key",
    "height",
    "difficulty",
    "hashrate_ths",
    "last_block_time",
    "peers",
    "version",
    "uptime_secs",
    "signature",
];

/// Hashrate exactly as the node sent it; the signature covers this form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignedHashrate {
    Number(#[serde(serialize_with = "canonical_f64")] f64),
    Text(String),
}

impl SignedHashrate {
    fn read(r: &FieldReader) -> ApiResult<Self> {
        match r.require("hashrate_ths")? {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| ApiError::invalid("hashrate_ths")),
            _ => Err(ApiError::invalid("hashrate_ths")),
        }
    }

    /// Numeric value for storage.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite())
    }
}

/// `POST /stats`
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRequest {
    pub node_id: String,
    pub public_key: String,
    pub height: u64,
    pub difficulty: f64,
    pub hashrate_ths: SignedHashrate,
    pub last_block_time: u64,
    pub peers: u64,
    pub version: String,
    pub uptime_secs: u64,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct StatsSigned<'a> {
    pub node_id: &'a str,
    pub public_key: &'a str,
    pub height: u64,
    #[serde(serialize_with = "canonical_f64")]
    pub difficulty: f64,
    pub hashrate_ths: &'a SignedHashrate,
    pub last_block_time: u64,
    pub peers: u64,
    pub version: &'a str,
    pub uptime_secs: u64,
}

impl StatsRequest {
    pub fn read(r: &FieldReader) -> ApiResult<Self> {
        r.require_all(&STATS_REQUIRED)?;

        let difficulty = r.f64("difficulty")?;
        if !difficulty.is_finite() {
            return Err(ApiError::bad_request(codes::INVALID_DIFFICULTY));
        }

        Ok(Self {
            node_id: r.string("node_id")?,
            public_key: r.string("public_key")?,
            height: r.u64("height")?,
            difficulty,
            hashrate_ths: SignedHashrate::read(r)?,
            last_block_time: r.u64("last_block_time")?,
            peers: r.u64("peers")?,
            version: r.string("version")?,
            uptime_secs: r.u64("uptime_secs")?,
            signature: r.string("signature")?,
        })
    }

    pub fn signed(&self) -> StatsSigned<'_> {
        StatsSigned {
            node_id: &self.node_id,
            public_key: &self.public_key,
            height: self.height,
            difficulty: self.difficulty,
            hashrate_ths: &self.hashrate_ths,
            last_block_time: self.last_block_time,
            peers: self.peers,
            version: &self.version,
            uptime_secs: self.uptime_secs,
        }
    }

    /// Stored form; a textual hashrate that is not a number is rejected.
    pub fn into_snapshot(self, received_at: u64) -> ApiResult<StatsSnapshot> {
        let hashrate_ths = self
            .hashrate_ths
            .value()
            .ok_or_else(|| ApiError::invalid("hashrate_ths"))?;

        Ok(StatsSnapshot {
            node_id: self.node_id,
            public_key: self.public_key,
            height: self.height,
            difficulty: self.difficulty,
            hashrate_ths,
            last_block_time: self.last_block_time,
            peers: self.peers,
            version: self.version,
            uptime_secs: self.uptime_secs,
            received_at,
            signature: self.signature,
        })
    }
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// Portion of a [`BootstrapPointer`] covered by `manifest_sig`.
#[derive(Debug, Serialize)]
pub struct PointerSigned<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<&'a str>,
    pub updated_at: u64,
}

impl<'a> From<&'a BootstrapPointer> for PointerSigned<'a> {
    fn from(p: &'a BootstrapPointer) -> Self {
        Self {
            url: &p.url,
            height: p.height,
            tip_hash: p.tip_hash.as_deref(),
            sha256: p.sha256.as_deref(),
            updated_at: p.updated_at,
        }
    }
}

/// `POST /bootstrap/pointer`. Optional fields of the wrong JSON type are
/// dropped rather than rejected; `updated_at` defaults to `now`.
pub fn read_pointer(r: &FieldReader, now: u64) -> ApiResult<BootstrapPointer> {
    let url = r
        .str_if_string("url")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing("url"))?;
    let text = |field: &str| r.str_if_string(field).map(String::from);

    Ok(BootstrapPointer {
        url: url.to_string(),
        height: r.u64_if_number("height"),
        tip_hash: text("tip_hash"),
        sha256: text("sha256"),
        publisher_pubkey: text("publisher_pubkey"),
        manifest_sig: text("manifest_sig"),
        updated_at: r.u64_if_number("updated_at").unwrap_or(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(v: Value) -> FieldReader {
        FieldReader::parse(v.to_string().as_bytes()).unwrap()
    }

    fn announce_body() -> Value {
        serde_json::json!({
            "port": 9000,
            "node_id": "node-1",
            "public_key": "aa",
            "version": "1.2.0",
            "height": 120,
            "last_seen": 1_700_000_000u64,
            "signature": "bb"
        })
    }

    #[test]
    fn test_announce_missing_field_in_order() {
        let mut body = announce_body();
        body.as_object_mut().unwrap().remove("version");
        body.as_object_mut().unwrap().remove("signature");
        let err = AnnounceRequest::read(&reader(body)).unwrap_err();
        assert_eq!(err.code(), "missing_version");
    }

    #[test]
    fn test_announce_canonical_defaults_ip() {
        let req = AnnounceRequest::read(&reader(announce_body())).unwrap();
        let bytes = signing_bytes(&req.signed("203.0.113.9")).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"ip":"203.0.113.9","port":9000,"node_id":"node-1","public_key":"aa","version":"1.2.0","height":120,"last_seen":1700000000}"#
        );
    }

    #[test]
    fn test_announce_canonical_optionals() {
        let mut body = announce_body();
        let obj = body.as_object_mut().unwrap();
        obj.insert("ip".into(), "198.51.100.1".into());
        obj.insert("latency_ms".into(), serde_json::json!(12.0));
        obj.insert("stats_port".into(), serde_json::json!(8787));
        let req = AnnounceRequest::read(&reader(body)).unwrap();
        let text = String::from_utf8(signing_bytes(&req.signed("10.0.0.1")).unwrap()).unwrap();
        assert!(text.starts_with(r#"{"ip":"198.51.100.1","#));
        assert!(text.ends_with(r#""last_seen":1700000000,"latency_ms":12,"stats_port":8787}"#));
    }

    #[test]
    fn test_blank_ip_falls_back() {
        let mut body = announce_body();
        body.as_object_mut().unwrap().insert("ip".into(), "  ".into());
        let req = AnnounceRequest::read(&reader(body)).unwrap();
        assert_eq!(req.effective_ip("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_port_range_checked_on_record() {
        let mut body = announce_body();
        body.as_object_mut().unwrap().insert("port".into(), serde_json::json!(70000));
        let req = AnnounceRequest::read(&reader(body)).unwrap();
        assert_eq!(req.into_record("1.2.3.4").unwrap_err().code(), "invalid_port");

        let mut body = announce_body();
        body.as_object_mut().unwrap().insert("port".into(), serde_json::json!(0));
        let req = AnnounceRequest::read(&reader(body)).unwrap();
        assert_eq!(req.into_record("1.2.3.4").unwrap_err().code(), "invalid_port");
    }

    fn headers_body(headers: Value) -> Value {
        serde_json::json!({
            "height": 11,
            "last_block_time": 1_700_000_000u64,
            "headers": headers,
            "node_id": "n",
            "public_key": "aa",
            "signature": "bb",
            "network_id": ""
        })
    }

    #[test]
    fn test_headers_bounds() {
        let err = HeadersRequest::read(&reader(headers_body(serde_json::json!([])))).unwrap_err();
        assert_eq!(err.code(), "invalid_headers");

        let err = HeadersRequest::read(&reader(headers_body(serde_json::json!({"a": 1}))))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_headers");

        let too_many: Vec<Value> = (0..=MAX_HEADERS as u64)
            .map(|h| serde_json::json!({"height": h, "hash": "x", "prev_hash": "y", "timestamp": 1}))
            .collect();
        let err = HeadersRequest::read(&reader(headers_body(Value::Array(too_many)))).unwrap_err();
        assert_eq!(err.code(), "invalid_headers");
    }

    #[test]
    fn test_headers_canonical_form() {
        let headers = serde_json::json!([
            {"height": 10, "hash": "h10", "prev_hash": "h9", "timestamp": 100},
            {"height": 11, "hash": "h11", "prev_hash": "h10", "timestamp": 101}
        ]);
        let body = reader(headers_body(headers));
        let mut req = HeadersRequest::read(&body).unwrap();
        req.read_metrics(&body).unwrap();
        assert_eq!(req.network_id, None);

        let text = String::from_utf8(signing_bytes(&req.signed()).unwrap()).unwrap();
        assert_eq!(
            text,
            r#"{"height":11,"last_block_time":1700000000,"headers":[{"height":10,"hash":"h10","prev_hash":"h9","timestamp":100},{"height":11,"hash":"h11","prev_hash":"h10","timestamp":101}],"node_id":"n","public_key":"aa"}"#
        );
    }

    fn stats_body(hashrate: Value) -> Value {
        serde_json::json!({
            "node_id": "n",
            "public_key": "aa",
            "height": 500,
            "difficulty": 3.0,
            "hashrate_ths": hashrate,
            "last_block_time": 1_700_000_000u64,
            "peers": 8,
            "version": "1.0.0",
            "uptime_secs": 3600,
            "signature": "bb"
        })
    }

    #[test]
    fn test_stats_hashrate_signed_as_sent() {
        let req = StatsRequest::read(&reader(stats_body("12.50".into()))).unwrap();
        let text = String::from_utf8(signing_bytes(&req.signed()).unwrap()).unwrap();
        assert!(text.contains(r#""difficulty":3,"hashrate_ths":"12.50","#));
        assert_eq!(req.into_snapshot(9).unwrap().hashrate_ths, 12.5);

        let req = StatsRequest::read(&reader(stats_body(serde_json::json!(4.0)))).unwrap();
        let text = String::from_utf8(signing_bytes(&req.signed()).unwrap()).unwrap();
        assert!(text.contains(r#""hashrate_ths":4,"#));
    }

    #[test]
    fn test_stats_unparseable_hashrate_text() {
        let req = StatsRequest::read(&reader(stats_body("fast".into()))).unwrap();
        assert_eq!(req.into_snapshot(9).unwrap_err().code(), "invalid_hashrate_ths");
    }

    #[test]
    fn test_pointer_loose_optionals() {
        let body = reader(serde_json::json!({
            "url": "https://cdn/x.zip",
            "height": "12",
            "tip_hash": "abc",
            "sha256": 7
        }));
        let ptr = read_pointer(&body, 42).unwrap();
        assert_eq!(ptr.height, None);
        assert_eq!(ptr.tip_hash.as_deref(), Some("abc"));
        assert_eq!(ptr.sha256, None);
        assert_eq!(ptr.updated_at, 42);

        let text = String::from_utf8(signing_bytes(&PointerSigned::from(&ptr)).unwrap()).unwrap();
        assert_eq!(text, r#"{"url":"https://cdn/x.zip","tip_hash":"abc","updated_at":42}"#);
    }

    #[test]
    fn test_pointer_requires_string_url() {
        for body in [serde_json::json!({}), serde_json::json!({"url": ""}), serde_json::json!({"url": 5})] {
            assert_eq!(read_pointer(&reader(body), 1).unwrap_err().code(), "missing_url");
        }
    }

    #[test]
    fn test_skew_window() {
        assert!(within_skew(1000, 400, 600));
        assert!(within_skew(1000, 1600, 600));
        assert!(!within_skew(1000, 1601, 600));
    }
}
