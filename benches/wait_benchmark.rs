/*!
 * Wait Benchmarks
 *
 * Measures the per-wait overhead of the poll/timeout protocol: worker
 * spawn, completion signaling, and teardown.
 */

use condwait::ConditionWaiter;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark: condition already true on the first poll
fn bench_immediate_success(c: &mut Criterion) {
    let waiter: ConditionWaiter = ConditionWaiter::new()
        .poll_delay(Duration::ZERO)
        .poll_interval(Duration::from_micros(50));

    c.bench_function("wait/immediate_success", |b| {
        b.iter(|| black_box(waiter.wait_until(|| true)))
    });
}

/// Benchmark: success after N polls
fn bench_polls_until_true(c: &mut Criterion) {
    let mut group = c.benchmark_group("wait/polls_until_true");

    for polls in [1u32, 3, 5].iter() {
        let waiter: ConditionWaiter = ConditionWaiter::new()
            .poll_delay(Duration::ZERO)
            .poll_interval(Duration::from_micros(10));

        group.bench_with_input(BenchmarkId::from_parameter(polls), polls, |b, &polls| {
            b.iter(|| {
                let calls = Arc::new(AtomicU32::new(0));
                let calls_clone = calls.clone();

                let result = waiter
                    .wait_until(move || calls_clone.fetch_add(1, Ordering::SeqCst) + 1 >= polls);
                black_box(result)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_immediate_success, bench_polls_until_true);
criterion_main!(benches);
