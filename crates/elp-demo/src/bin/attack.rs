//! Attacker simulator for the demo server: four canonical probes against
//! a stealth-mode deployment (no `reality` field in the response — the
//! point of the exercise is that an attacker can only ever guess).

use clap::Parser;
use elp_core::seal;
use serde_json::Value;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080/api/v1/resource")]
    target: String,

    #[arg(long, env = "ELP_SECRET", default_value = "SUA_CHAVE_MESTRA_AQUI")]
    secret: String,
}

struct Attacker {
    secret: Vec<u8>,
    client: reqwest::Client,
    target: String,
}

struct Headers {
    mask: i64,
    seal: String,
    timestamp_ms: i64,
    nonce: String,
}

impl Attacker {
    fn generate_headers(&self, mask: i64, bad_sig: bool, nonce: Option<String>, timestamp_ms: Option<i64>) -> Headers {
        let ts = timestamp_ms.unwrap_or_else(|| elp_core::freshness::now_ms().unwrap());
        let nonce = nonce.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut sig = seal::compute(&self.secret, mask, "GET", ts, "/api/v1/resource", &nonce);
        if bad_sig {
            sig = "A".repeat(sig.len());
        }
        Headers {
            mask,
            seal: sig,
            timestamp_ms: ts,
            nonce,
        }
    }

    async fn send(&self, headers: &Headers) -> Result<(reqwest::StatusCode, Value, u128), reqwest::Error> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(&self.target)
            .header("X-ELP-Mask", headers.mask.to_string())
            .header("X-ELP-Seal", &headers.seal)
            .header("X-ELP-Timestamp", headers.timestamp_ms.to_string())
            .header("X-ELP-Nonce", &headers.nonce)
            .send()
            .await?;
        let latency_ms = start.elapsed().as_millis();
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok((status, body, latency_ms))
    }

    async fn attack(&self, scenario: &str, headers: Headers) {
        println!("\n--- [{scenario}] ---");
        match self.send(&headers).await {
            Ok((status, body, latency_ms)) => {
                println!("[*] http status: {status}");
                println!("[*] latency: {latency_ms}ms");
                let snippet = body.to_string();
                let preview: String = snippet.chars().take(120).collect();
                println!("[*] payload: {preview}...");
                for marker in elp_core::shadow::FORBIDDEN_MARKERS {
                    if snippet.to_lowercase().contains(marker) {
                        println!("[!] unexpected: leaked synthetic-data marker '{marker}'");
                    }
                }
            }
            Err(e) => println!("[!] connection error: {e}"),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let attacker = Attacker {
        secret: args.secret.into_bytes(),
        client: reqwest::Client::new(),
        target: args.target,
    };

    // 1. Legitimate user: mask 5 (0b101), non-adjacent bits.
    attacker
        .attack("LEGITIMATE USER", attacker.generate_headers(5, false, None, None))
        .await;

    // 2. Topology violation: mask 6 (0b110), adjacent bits.
    attacker
        .attack(
            "ZECKENDORF VIOLATION",
            attacker.generate_headers(6, false, None, None),
        )
        .await;

    // 3. Forged signature: valid mask, corrupted seal.
    attacker
        .attack("FORGED SEAL", attacker.generate_headers(5, true, None, None))
        .await;

    // 4. Replay: send a valid request, then resend the same headers.
    println!("\n--- [PREPARING REPLAY] ---");
    let valid = attacker.generate_headers(5, false, None, None);
    println!("sending the original request...");
    let _ = attacker.send(&valid).await;
    let replay = Headers {
        mask: valid.mask,
        seal: valid.seal.clone(),
        timestamp_ms: valid.timestamp_ms,
        nonce: valid.nonce.clone(),
    };
    attacker.attack("REPLAY ATTACK", replay).await;
}
