//! # Chainwatch Gateway Benchmarks
//!
//! Hot paths of the admission and read endpoints:
//!
//! | Path | Work per request |
//! |------|------------------|
//! | signed POSTs | canonicalize + Ed25519 verify |
//! | `POST /headers` | linkage check over up to 256 headers |
//! | `GET /peers` | dedupe + score + sort over the live set |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cw_01_peer_registry::{dedupe_by_endpoint, rank};
use cw_02_snapshot_quorum::{validate, MAX_HEADERS};
use rand::Rng;
use serde_json::json;
use shared_crypto::{canonicalize, verify_detached, Ed25519KeyPair};
use shared_types::{HeaderEntry, PeerRecord};
use std::time::Duration;

const NOW: u64 = 1_700_000_000;

fn bench_signature_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature-admission");
    group.measurement_time(Duration::from_secs(10));

    let key = Ed25519KeyPair::from_seed([7; 32]);
    let public_key = key.public_key_hex();
    let body = json!({
        "ip": "8.8.8.8",
        "port": 9000,
        "node_id": "bench-node",
        "public_key": public_key,
        "version": "1.0.0",
        "height": 123_456,
        "last_seen": NOW,
    });
    let message = canonicalize(&body).unwrap();
    let signature = key.sign_hex(&message);

    group.bench_function("canonicalize", |b| {
        b.iter(|| black_box(canonicalize(&body).unwrap()))
    });
    group.bench_function("verify_detached", |b| {
        b.iter(|| black_box(verify_detached(&message, &signature, &public_key)))
    });
    group.finish();
}

fn bench_header_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("header-chain");

    for len in [16usize, 64, MAX_HEADERS] {
        let headers: Vec<HeaderEntry> = (1..=len as u64)
            .map(|h| HeaderEntry {
                height: h,
                hash: format!("{h:064x}"),
                prev_hash: format!("{:064x}", h - 1),
                timestamp: NOW + h,
            })
            .collect();

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("validate", len), &headers, |b, headers| {
            b.iter(|| black_box(validate(headers).is_ok()))
        });
    }
    group.finish();
}

fn bench_peer_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("peer-ranking");
    let mut rng = rand::thread_rng();

    for size in [100usize, 1_000, 5_000] {
        let peers: Vec<PeerRecord> = (0..size)
            .map(|i| PeerRecord {
                // Roughly one endpoint in four is shared.
                ip: format!("10.{}.{}.{}", i % 7, (i / 4) % 250, (i / 4) % 200),
                port: 9000,
                node_id: format!("node-{i}"),
                version: "1.0.0".into(),
                height: rng.gen_range(1_000..1_100),
                last_seen: NOW - rng.gen_range(0..1_800),
                first_seen: Some(NOW - rng.gen_range(0..86_400)),
                seen_count: Some(rng.gen_range(1..500)),
                stats_port: None,
                latency_ms: Some(rng.gen_range(5.0..400.0)),
                signature: String::new(),
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("dedupe_rank", size), &peers, |b, peers| {
            b.iter(|| black_box(rank(dedupe_by_endpoint(peers.clone()), NOW)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_signature_admission,
    bench_header_chain,
    bench_peer_ranking
);
criterion_main!(benches);
