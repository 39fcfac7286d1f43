//! # Integrity-Core Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | HashEngine | digest of a 4KB record | < 50µs |
//! | HybridCipher | encrypt + decrypt 4KB | < 1ms |
//! | AnchorQueue | enqueue + claim (in-memory) | < 20µs per entry |
//! | AuditExporter | export 1,000 rows | < 10ms |

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use ic_01_anchor_queue::{AnchorQueue, AnchorQueueApi, AnchorQueueConfig, InMemoryAnchorStore};
use ic_04_audit_export::{AuditExporter, AuditExporterApi, AuditRow, InMemoryAuditStore};
use shared_crypto::{CanonicalSubject, ContentHash, HashEngine, HybridCipher, RecordFields, SubjectType};
use shared_types::SubjectId;

fn random_text(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

fn record(content: String) -> RecordFields {
    RecordFields {
        record_id: "rec-bench".into(),
        patient_id: "patient-bench".into(),
        provider_id: "provider-bench".into(),
        record_type: "lab_result".into(),
        content,
        created_at: Utc::now(),
    }
}

// ============================================================================
// HashEngine
// ============================================================================

fn bench_hash_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash-engine");

    for size in [256usize, 4 * 1024, 64 * 1024] {
        let subject = CanonicalSubject::Record(record(random_text(size)));
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("digest_record", size), &subject, |b, s| {
            b.iter(|| black_box(HashEngine::digest_subject(s).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// HybridCipher
// ============================================================================

fn bench_hybrid_cipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid-cipher");
    group.measurement_time(Duration::from_secs(10));

    let cipher = HybridCipher::new();
    let keys = cipher.generate_keypair();
    let plaintext = random_text(4 * 1024).into_bytes();

    group.bench_function("generate_keypair", |b| b.iter(|| black_box(cipher.generate_keypair())));

    group.throughput(Throughput::Bytes(plaintext.len() as u64));
    group.bench_function("encrypt_4k", |b| {
        b.iter(|| black_box(cipher.encrypt(&plaintext, &keys.public).unwrap()))
    });

    let payload = cipher.encrypt(&plaintext, &keys.public).unwrap();
    group.bench_function("decrypt_4k", |b| {
        b.iter(|| black_box(cipher.decrypt(&payload, &keys.private).unwrap()))
    });
    group.finish();
}

// ============================================================================
// AnchorQueue
// ============================================================================

fn bench_anchor_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchor-queue");

    for batch in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("enqueue_then_claim", batch), &batch, |b, &n| {
            b.iter(|| {
                let queue = AnchorQueue::new(
                    AnchorQueueConfig::default(),
                    Arc::new(InMemoryAnchorStore::new()),
                );
                for i in 0..n {
                    let mut digest = [0u8; 32];
                    digest[..8].copy_from_slice(&(i as u64).to_be_bytes());
                    queue
                        .enqueue(
                            &ContentHash::from_digest(SubjectType::Record, digest),
                            SubjectId::new(format!("s{i}")),
                        )
                        .unwrap();
                }
                black_box(queue.claim_batch(n).unwrap())
            })
        });
    }
    group.finish();
}

// ============================================================================
// AuditExporter
// ============================================================================

fn bench_audit_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit-export");

    for rows in [100usize, 1_000] {
        let exporter = AuditExporter::new(Arc::new(InMemoryAuditStore::new()));
        let start = Utc::now();
        for i in 0..rows {
            exporter
                .record(AuditRow::new(
                    start + chrono::Duration::milliseconds(i as i64),
                    format!("user-{}", i % 17),
                    "view_record",
                    format!("record:{i}"),
                    "success",
                ))
                .unwrap();
        }
        let until = start + chrono::Duration::milliseconds(rows as i64);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("export", rows), &rows, |b, _| {
            b.iter(|| black_box(exporter.export(start, until, "bench").unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_hash_engine,
    bench_hybrid_cipher,
    bench_anchor_queue,
    bench_audit_export
);
criterion_main!(benches);
