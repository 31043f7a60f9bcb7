use std::fmt::Write;

use super::MetricsSnapshot;

// Series names and help strings are a stable scrape surface; dashboards
// key on them.
const TXN_COUNT: &str = "txncount";
const TXN_ERRORS: &str = "txnerrors";
const TXN_IN_FLIGHT: &str = "txninflight";
const TXN_LATENCY: &str = "txnlatencysummary";

/// Renders a snapshot in the Prometheus text exposition format. Latency is
/// exposed in seconds; quantiles come from the snapshot's histogram summary.
pub fn render(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::with_capacity(768);

    write_counter(
        &mut out,
        TXN_COUNT,
        "Number of web3 transactions made",
        snapshot.txn_count,
    );
    write_counter(
        &mut out,
        TXN_ERRORS,
        "Number of errored web3 transactions",
        snapshot.txn_errors,
    );

    let _ = writeln!(out, "# HELP {TXN_IN_FLIGHT} Number of transactions awaiting completion");
    let _ = writeln!(out, "# TYPE {TXN_IN_FLIGHT} gauge");
    let _ = writeln!(out, "{TXN_IN_FLIGHT} {}", snapshot.in_flight);
    out.push('\n');

    let lat = &snapshot.latency;
    let _ = writeln!(out, "# HELP {TXN_LATENCY} Latency summary of web3 transactions");
    let _ = writeln!(out, "# TYPE {TXN_LATENCY} summary");
    let _ = writeln!(out, "{TXN_LATENCY}{{quantile=\"0.5\"}} {}", secs(lat.p50_us));
    let _ = writeln!(out, "{TXN_LATENCY}{{quantile=\"0.9\"}} {}", secs(lat.p90_us));
    let _ = writeln!(out, "{TXN_LATENCY}{{quantile=\"0.99\"}} {}", secs(lat.p99_us));
    let _ = writeln!(out, "{TXN_LATENCY}_sum {}", secs(lat.sum_us));
    let _ = writeln!(out, "{TXN_LATENCY}_count {}", lat.count);

    out
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
    out.push('\n');
}

fn secs(us: u64) -> f64 {
    us as f64 / 1_000_000.0
}
