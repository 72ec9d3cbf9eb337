use hdrhistogram::Histogram;
use smart_park::{AllocationManager, Command, Engine};
use std::time::Instant;

fn main() {
    println!("Preparing Latency Benchmark...");

    // 10k slots, in-memory ledger so the numbers measure allocation, not disk
    let mut engine = Engine::new(
        AllocationManager::in_memory(10_000, 1_000).expect("valid lot configuration"),
    );

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 1_000_000, 3).unwrap();

    const ITERATIONS: u64 = 200_000;
    // Keep roughly half the lot occupied so both pools see traffic
    const WINDOW: u64 = 5_000;

    println!("Running {} check-in/check-out pairs...", ITERATIONS);

    let mut total_duration = std::time::Duration::new(0, 0);

    for i in 0..ITERATIONS {
        let vip = i % 10 == 0;
        let cmd = Command::check_in(format!("P{i}"), vip);

        let start = Instant::now();
        std::hint::black_box(engine.process_command(cmd));
        let elapsed = start.elapsed();
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;

        if i >= WINDOW {
            let cmd = Command::check_out(format!("P{}", i - WINDOW));
            let start = Instant::now();
            std::hint::black_box(engine.process_command(cmd));
            let elapsed = start.elapsed();
            histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
            total_duration += elapsed;
        }
    }

    let ops = histogram.len();
    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", ops);
    println!("Throughput: {:.2} ops/sec", ops as f64 / total_duration.as_secs_f64());
    println!("Rejected:   {}", engine.stats().rejected);
    println!("---------------------------");
    println!("Min:    {:7} ns", histogram.min());
    println!("P50:    {:7} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:7} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:7} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:7} ns", histogram.value_at_quantile(0.999));
    println!("Max:    {:7} ns", histogram.max());
    println!("---------------------------");

    println!("\nDistribution:");
    for v in histogram.iter_log(1_000, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:8} ns: {:10} count", v.value_iterated_to(), count);
        }
    }
}
