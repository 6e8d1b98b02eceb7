//! # Node Lifecycle Over HTTP
//!
//! Drives the full router the way a fleet of nodes would: announce, attest a
//! header segment, push stats, and watch `/chain-snapshot` move from pending
//! to signed. Signed bodies are built with the gateway's own canonical forms.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{segment, signer, UnreachableProbe, T0};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use cw_04_http_gateway::domain::requests::{
        AnnounceSigned, HeadersSigned, SignedHashrate, StatsSigned,
    };
    use cw_04_http_gateway::{GatewayConfig, GatewayService, Upstreams};
    use serde_json::{json, Value};
    use shared_crypto::{canonicalize, Ed25519KeyPair};
    use shared_store::MemoryStore;
    use shared_types::{HeaderEntry, ManualTimeSource};
    use std::sync::Arc;
    use tower::ServiceExt;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Node {
        id: String,
        ip: String,
        key: Ed25519KeyPair,
    }

    impl Node {
        fn new(id: &str, ip: &str, seed: u8) -> Self {
            Self {
                id: id.into(),
                ip: ip.into(),
                key: signer(seed),
            }
        }

        fn public_key(&self) -> String {
            self.key.public_key_hex()
        }

        fn sign<T: serde::Serialize>(&self, signed: &T) -> String {
            self.key.sign_hex(&canonicalize(signed).unwrap())
        }

        fn announce(&self, height: u64, now: u64) -> Value {
            let pk = self.public_key();
            let signature = self.sign(&AnnounceSigned {
                ip: &self.ip,
                port: 9000,
                node_id: &self.id,
                public_key: &pk,
                version: "1.0.0",
                height,
                last_seen: now,
                latency_ms: Some(35.5),
                stats_port: None,
            });
            json!({
                "port": 9000,
                "node_id": self.id,
                "public_key": pk,
                "version": "1.0.0",
                "height": height,
                "last_seen": now,
                "latency_ms": 35.5,
                "signature": signature,
            })
        }

        fn headers(&self, headers: &[HeaderEntry], now: u64) -> Value {
            let pk = self.public_key();
            let height = headers.last().map_or(0, |h| h.height);
            let signature = self.sign(&HeadersSigned {
                height,
                network_id: Some("main"),
                last_block_time: now,
                difficulty: Some(2.0),
                hashrate_ths: None,
                headers,
                node_id: &self.id,
                public_key: &pk,
            });
            json!({
                "height": height,
                "network_id": "main",
                "last_block_time": now,
                "difficulty": 2,
                "headers": headers,
                "node_id": self.id,
                "public_key": pk,
                "signature": signature,
            })
        }

        fn stats(&self, height: u64, now: u64) -> Value {
            let pk = self.public_key();
            let hashrate = SignedHashrate::Text("40.25".into());
            let signature = self.sign(&StatsSigned {
                node_id: &self.id,
                public_key: &pk,
                height,
                difficulty: 2.0,
                hashrate_ths: &hashrate,
                last_block_time: now,
                peers: 5,
                version: "1.0.0",
                uptime_secs: 900,
            });
            json!({
                "node_id": self.id,
                "public_key": pk,
                "height": height,
                "difficulty": 2.0,
                "hashrate_ths": "40.25",
                "last_block_time": now,
                "peers": 5,
                "version": "1.0.0",
                "uptime_secs": 900,
                "signature": signature,
            })
        }
    }

    struct Gateway {
        clock: Arc<ManualTimeSource>,
        router: Router,
    }

    impl Gateway {
        fn new(trusted: &[&Node]) -> Self {
            let mut config = GatewayConfig::default();
            config.trust.header_keys = trusted.iter().map(|n| n.public_key()).collect();

            let clock = Arc::new(ManualTimeSource::at_secs(T0));
            let store = Arc::new(MemoryStore::with_time_source(clock.clone()));
            let service = GatewayService::new(
                config,
                store,
                clock.clone(),
                Upstreams {
                    indexer: None,
                    probe: Arc::new(UnreachableProbe),
                },
            )
            .unwrap();
            Self {
                clock,
                router: service.router(),
            }
        }

        fn now(&self) -> u64 {
            use shared_types::TimeSource;
            self.clock.now_secs()
        }

        async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        async fn post(&self, path: &str, from: &Node, body: Value) -> (StatusCode, Value) {
            let req = Request::post(path)
                .header("x-forwarded-for", format!("{}, 10.0.0.1", from.ip))
                .body(Body::from(body.to_string()))
                .unwrap();
            self.call(req).await
        }

        async fn get(&self, path: &str) -> Value {
            let (status, body) = self
                .call(Request::get(path).body(Body::empty()).unwrap())
                .await;
            assert_eq!(status, StatusCode::OK, "{path}: {body}");
            body
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: ANNOUNCE → ATTEST → STATUS
    // =============================================================================

    #[tokio::test]
    async fn test_fleet_reaches_signed_status() {
        let alpha = Node::new("alpha", "8.8.8.8", 11);
        let beta = Node::new("beta", "9.9.9.9", 12);
        let gw = Gateway::new(&[&alpha, &beta]);

        // Both nodes announce; the client IP comes from the first forwarded hop.
        for node in [&alpha, &beta] {
            let (status, body) = gw.post("/announce", node, node.announce(10, gw.now())).await;
            assert_eq!(status, StatusCode::OK, "{body}");
        }
        let peers = gw.get("/peers").await;
        assert_eq!(peers["count"], 2);
        let ips: Vec<&str> = peers["peers"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["ip"].as_str())
            .collect();
        assert!(ips.contains(&"8.8.8.8") && ips.contains(&"9.9.9.9"));

        // Two known peers: out of bootstrap mode, two signers required.
        let chain = segment(100, 8);
        let (_, first) = gw.post("/headers", &alpha, alpha.headers(&chain, gw.now())).await;
        assert_eq!(first["verified"], false);
        assert_eq!(first["bootstrap"], false);
        assert_eq!(first["required_quorum"], 2);

        let pending = gw.get("/chain-snapshot").await;
        assert_eq!(pending["source"], "pending");
        assert_eq!(pending["verified"], false);
        assert_eq!(pending["snapshot"]["height"], 100);

        let (_, second) = gw.post("/headers", &beta, beta.headers(&chain, gw.now())).await;
        assert_eq!(second["verified"], true);

        gw.clock.advance_secs(30);
        let signed = gw.get("/chain-snapshot").await;
        assert_eq!(signed["source"], "snapshot");
        assert_eq!(signed["verified"], true);
        assert_eq!(signed["verify_reason"], "signed_snapshot_available");
        assert_eq!(signed["peers"], 2);

        let history = gw.get("/snapshot-history").await;
        assert_eq!(history["count"], 1);
        assert_eq!(history["history"][0]["network_id"], "main");
    }

    #[tokio::test]
    async fn test_pushed_stats_extend_signed_height() {
        let alpha = Node::new("alpha", "8.8.8.8", 21);
        let beta = Node::new("beta", "9.9.9.9", 22);
        let gw = Gateway::new(&[&alpha, &beta]);

        let chain = segment(200, 4);
        for node in [&alpha, &beta] {
            let (status, body) = gw.post("/headers", node, node.headers(&chain, gw.now())).await;
            assert_eq!(status, StatusCode::OK, "{body}");
        }
        assert_eq!(gw.get("/headers").await["snapshot"]["height"], 200);

        let (status, body) = gw.post("/stats", &alpha, alpha.stats(201, gw.now())).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let latest = gw.get("/stats-latest").await;
        assert_eq!(latest["latest"]["hashrate_ths"], 40.25);

        gw.clock.advance_secs(10);
        let status = gw.get("/chain-snapshot").await;
        assert_eq!(status["source"], "push");
        assert_eq!(status["verified"], true);
        assert_eq!(status["stats"]["height"], 201);
        assert_eq!(status["peers"], 5);
    }

    #[tokio::test]
    async fn test_replayed_announce_outside_skew_rejected() {
        let alpha = Node::new("alpha", "8.8.8.8", 31);
        let gw = Gateway::new(&[&alpha]);

        let body = alpha.announce(10, gw.now());
        let (status, _) = gw.post("/announce", &alpha, body.clone()).await;
        assert_eq!(status, StatusCode::OK);

        gw.clock.advance_secs(3_600);
        let (status, reply) = gw.post("/announce", &alpha, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["error"], "timestamp_skew");
    }
}
