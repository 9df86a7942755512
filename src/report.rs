//! Line-oriented reporting: per-batch progress rows, the birthday-bound ETA
//! estimate, and the final collision summary.

use std::time::Instant;

use crate::stage1::BatchStats;
use crate::stage2::{ChainState, Outcome};

/// Length in bytes of the longest common prefix of two digests.
pub fn lcp_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Remaining-time estimate for a birthday search over a 2^bits space at the
/// current hash rate.
///
/// Expected total work is sqrt(2 * space + h^2); what is left after h hashes
/// is that minus h.
pub fn eta_secs(bits: u32, hashes: u64, hps: f64) -> f64 {
    let space = 2.0_f64.powi(bits as i32);
    let h = hashes as f64;
    ((2.0 * space + h * h).sqrt() - h) / hps
}

/// Per-batch monitor for [`crate::Collider::run`]: prints one aligned row
/// per batch plus a truncation warning when DP records were dropped.
pub fn batch_printer(n: usize) -> impl FnMut(&BatchStats) {
    let start = Instant::now();
    let mut prev: Option<(Instant, u64)> = None;
    move |stats| {
        if prev.is_none() {
            println!(
                "{b:>7} {h:>16} {c:>12} {m:>6} {r:>9} {e:>10}",
                b = "batch",
                h = "hashes",
                c = "chains",
                m = "maxdp",
                r = "mh/s",
                e = "eta"
            );
        }
        let now = Instant::now();
        let (prev_t, prev_h) = prev.unwrap_or((start, 0));
        let hps = (stats.total_hashes - prev_h) as f64 / (now - prev_t).as_secs_f64().max(1e-9);
        let eta = eta_secs(8 * n as u32, stats.total_hashes, hps);
        println!(
            "{b:>7} {h:>16} {c:>12} {m:>6} {r:>9.2} {e:>10.1}",
            b = stats.batch,
            h = stats.total_hashes,
            c = stats.chains,
            m = stats.max_dp,
            r = hps / 1e6,
            e = eta
        );
        if stats.dropped > 0 {
            eprintln!(
                "warning: {} DP records dropped this batch (buffer capacity reached)",
                stats.dropped
            );
        }
        prev = Some((now, stats.total_hashes));
    }
}

/// Final summary. Returns the measured LCP length in bytes.
pub fn print_collision(
    x: &ChainState,
    y: &ChainState,
    outcome: Outcome,
    total_hashes: u64,
    duration_secs: f64,
) -> usize {
    let lcp = lcp_len(&x.digest, &y.digest);
    match outcome {
        Outcome::Collision => {
            println!("Found a partial collision! ({lcp} bytes matched)");
            println!("Total hash count: {total_hashes}");
            println!("Duration: {duration_secs:.2} seconds");
            println!(
                "Hashing speed: {:.0} hashes per second",
                total_hashes as f64 / duration_secs.max(1e-9)
            );
            println!("Input 1:  {}", hex::encode(&x.input));
            println!("Output 1: {}", hex::encode(&x.digest));
            println!("Input 2:  {}", hex::encode(&y.input));
            println!("Output 2: {}", hex::encode(&y.digest));
        }
        Outcome::SameChain => {
            println!(
                "False collision: both chains walked the same inputs ({lcp} bytes matched, one input twice)"
            );
        }
        Outcome::NoMeet => {
            println!("No collision: chains walked to their starts without meeting ({lcp} bytes matched)");
        }
    }
    lcp
}
