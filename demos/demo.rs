//! Demo application driving windowed counters from worker threads.
//!
//! Run with:
//! ```bash
//! cargo run --example demo --features demo -- --help
//! ```

use clap::{Parser, ValueEnum};
use finestra::counters::scalar::Scalar;
use finestra::counters::windowed::Windowed;
use finestra::counters::Observable;
use finestra::observers::json::JsonObserver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Output format for counter serialization.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One `name (kind) value` line per counter
    Text,
    /// JSON snapshot
    Json,
}

/// Demo application for finestra - sliding-window rate counters.
///
/// Worker threads generate synthetic requests for a while; the counters are
/// printed in the chosen format while traffic flows and after it stops.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include timestamp in JSON output
    #[arg(long)]
    timestamp: bool,

    /// Number of worker threads generating traffic
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Pause between two requests of the same worker, in microseconds
    #[arg(long, default_value = "500")]
    pause_us: u64,

    /// How long the workers keep generating traffic, in milliseconds
    #[arg(short, long, default_value = "3000")]
    duration_ms: u64,

    /// Buckets per window for the windowed counters
    #[arg(short, long, default_value = "20")]
    resolution: i64,

    /// Refresh interval while traffic flows, in milliseconds
    #[arg(short, long, default_value = "500")]
    watch: u64,
}

struct Counters {
    requests: Scalar,
    per_second: Windowed,
    per_ten_seconds: Windowed,
    errors_per_second: Windowed,
}

impl Counters {
    fn new(resolution: i64) -> Self {
        Counters {
            requests: Scalar::new().with_name("http_requests_total"),
            per_second: Windowed::new(Duration::from_secs(1))
                .with_resolution(resolution)
                .with_name("http_requests_last_1s"),
            per_ten_seconds: Windowed::new(Duration::from_secs(10))
                .with_resolution(resolution)
                .with_name("http_requests_last_10s"),
            errors_per_second: Windowed::new(Duration::from_secs(1))
                .with_resolution(resolution)
                .with_name("http_errors_last_1s"),
        }
    }

    fn observables(&self) -> Vec<&dyn Observable> {
        vec![
            &self.requests,
            &self.per_second,
            &self.per_ten_seconds,
            &self.errors_per_second,
        ]
    }
}

/// Spawns workers recording requests until `stop` is raised.
fn spawn_traffic(
    counters: &Arc<Counters>,
    stop: &Arc<AtomicBool>,
    num_threads: usize,
    pause: Duration,
) -> Vec<thread::JoinHandle<()>> {
    (0..num_threads)
        .map(|i| {
            let counters = Arc::clone(counters);
            let stop = Arc::clone(stop);
            thread::spawn(move || {
                let mut j = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    counters.requests.incr(1);
                    counters.per_second.incr(1);
                    counters.per_ten_seconds.incr(1);

                    // Simulate ~5% error rate
                    if (i + j) % 20 == 0 {
                        counters.errors_per_second.incr(1);
                    }

                    j += 1;
                    thread::sleep(pause);
                }
            })
        })
        .collect()
}

/// Renders counters in the specified format.
fn render_output(args: &Args, counters: Vec<&dyn Observable>) -> String {
    match args.format {
        OutputFormat::Text => {
            let width = counters.iter().map(|c| c.name().len()).max().unwrap_or(0);
            counters
                .iter()
                .map(|c| {
                    format!(
                        "{:<width$} ({:<7}) {:>8}",
                        c.name(),
                        c.metric_kind().to_string(),
                        c.value()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }

        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .timestamped(args.timestamp)
            .to_json(counters)
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

fn main() {
    let args = Args::parse();

    if args.resolution < 1 {
        eprintln!("--resolution must be at least 1");
        std::process::exit(2);
    }

    let counters = Arc::new(Counters::new(args.resolution));
    let stop = Arc::new(AtomicBool::new(false));

    eprintln!(
        "Generating traffic with {} threads for {} ms...",
        args.threads, args.duration_ms
    );
    let handles = spawn_traffic(
        &counters,
        &stop,
        args.threads,
        Duration::from_micros(args.pause_us),
    );

    let deadline = Instant::now() + Duration::from_millis(args.duration_ms);
    let refresh = Duration::from_millis(args.watch.max(1));

    while Instant::now() < deadline {
        thread::sleep(refresh);
        // Clear screen (ANSI escape code)
        print!("\x1B[2J\x1B[1;1H");
        println!("{}", render_output(&args, counters.observables()));
    }

    stop.store(true, Ordering::Relaxed);
    for handle in handles {
        let _ = handle.join();
    }

    eprintln!("Traffic stopped, waiting for the 1s windows to drain...\n");
    thread::sleep(Duration::from_millis(1100));
    println!("{}", render_output(&args, counters.observables()));
}
