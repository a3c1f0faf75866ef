//! Event bus emission benchmarks.
//!
//! Measures fan-out cost for persistent listeners and the full frame
//! routing path (`raw` + semantic channel + `all`).
//!
//! Run with: cargo bench --bench event_bus
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use blockv_realtime::{EventBus, InboundFrame, channel};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 10, 100];

const INVENTORY_FRAME: &str =
    r#"{"msg_type":"inventory","payload":{"id":"vatom-1","new_owner":"user-2","old_owner":"user-1"}}"#;

// ============================================================================
// Benchmark: Fan-out
// ============================================================================

fn bench_emit_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fan_out");
    let payload = json!({ "msg_type": "state_update", "id": "vatom-1" });

    for &count in LISTENER_COUNTS {
        let bus: EventBus<Value> = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            let hits = Arc::clone(&hits);
            bus.subscribe(channel::STATE_UPDATE, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        group.bench_with_input(BenchmarkId::new("listeners", count), &count, |b, _| {
            b.iter(|| bus.emit(black_box(channel::STATE_UPDATE), black_box(&payload)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Frame Routing
// ============================================================================

fn bench_frame_routing(c: &mut Criterion) {
    let bus: EventBus<Value> = EventBus::new();
    for name in [channel::RAW, channel::INVENTORY, channel::ALL] {
        bus.subscribe(name, |value| {
            black_box(value);
        });
    }

    c.bench_function("route_inventory_frame", |b| {
        b.iter(|| {
            let Ok(frame) = InboundFrame::parse(black_box(INVENTORY_FRAME)) else {
                return;
            };
            bus.emit(channel::RAW, &frame.payload);
            if let Some(semantic) = frame.channel() {
                bus.emit(semantic, &frame.payload);
            }
            if frame.is_non_empty() {
                bus.emit(channel::ALL, &frame.payload);
            }
        });
    });
}

criterion_group!(benches, bench_emit_fan_out, bench_frame_routing);
criterion_main!(benches);
