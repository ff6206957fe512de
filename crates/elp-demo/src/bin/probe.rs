//! Statistical timing-distinguishability probe: sends N PRIME-eliciting
//! requests and N SHADOW-eliciting requests against a running demo
//! server, then compares latency distributions. Not asserted in CI —
//! the equalizer's window is a design choice, not a guaranteed bound,
//! and this binary is a manual check of whether it holds in practice.

use clap::Parser;
use elp_core::seal;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080/api/v1/resource")]
    target: String,

    #[arg(long, env = "ELP_SECRET", default_value = "SUA_CHAVE_MESTRA_AQUI")]
    secret: String,

    #[arg(long, default_value_t = 100)]
    samples: usize,
}

async fn sample_latency_ms(
    client: &reqwest::Client,
    target: &str,
    secret: &[u8],
    mask: i64,
    bad_sig: bool,
) -> Option<u128> {
    let ts = elp_core::freshness::now_ms().ok()?;
    let nonce = uuid::Uuid::new_v4().to_string();
    let mut sig = seal::compute(secret, mask, "GET", ts, "/api/v1/resource", &nonce);
    if bad_sig {
        sig = "A".repeat(sig.len());
    }

    let start = std::time::Instant::now();
    let response = client
        .get(target)
        .header("X-ELP-Mask", mask.to_string())
        .header("X-ELP-Seal", sig)
        .header("X-ELP-Timestamp", ts.to_string())
        .header("X-ELP-Nonce", nonce)
        .send()
        .await
        .ok()?;
    let _ = response.bytes().await;
    Some(start.elapsed().as_millis())
}

fn mean(samples: &[u128]) -> f64 {
    samples.iter().sum::<u128>() as f64 / samples.len() as f64
}

fn stddev(samples: &[u128], mean_value: f64) -> f64 {
    let variance = samples
        .iter()
        .map(|s| {
            let d = *s as f64 - mean_value;
            d * d
        })
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let client = reqwest::Client::new();

    let mut prime_samples = Vec::with_capacity(args.samples);
    let mut shadow_samples = Vec::with_capacity(args.samples);

    for _ in 0..args.samples {
        if let Some(ms) = sample_latency_ms(&client, &args.target, args.secret.as_bytes(), 5, false).await {
            prime_samples.push(ms);
        }
        if let Some(ms) = sample_latency_ms(&client, &args.target, args.secret.as_bytes(), 6, false).await {
            shadow_samples.push(ms);
        }
    }

    let prime_mean = mean(&prime_samples);
    let shadow_mean = mean(&shadow_samples);
    let prime_stddev = stddev(&prime_samples, prime_mean);
    let shadow_stddev = stddev(&shadow_samples, shadow_mean);

    println!("PRIME  n={:<4} mean={:7.2}ms stddev={:6.2}ms", prime_samples.len(), prime_mean, prime_stddev);
    println!("SHADOW n={:<4} mean={:7.2}ms stddev={:6.2}ms", shadow_samples.len(), shadow_mean, shadow_stddev);

    let mean_gap_ms = (prime_mean - shadow_mean).abs();
    println!("mean gap: {mean_gap_ms:.2}ms");
    if mean_gap_ms > prime_stddev.max(shadow_stddev) {
        println!("[!] mean gap exceeds either distribution's stddev - realities may be distinguishable by timing");
    } else {
        println!("[*] distributions overlap within one stddev - timing does not obviously distinguish realities");
    }
}
