//! Live test runner for the fleet subscriber server.
//!
//! Connects to a running `server_machines` instance, verifies the
//! pre-auth behavior (snapshot push works, on-demand queries are
//! rejected), optionally authenticates with a real token, and then
//! reports per-type message rates until interrupted.
//!
//! Run it against a local stack with:
//! `cargo run --bin test_machines_ws -- --url ws://127.0.0.1:9003/ws`

use clap::Parser;
use futures_util::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the subscriber server
    #[clap(long, default_value = "ws://127.0.0.1:9003/ws")]
    url: String,

    /// Access token for the on-demand query phase; skipped when absent
    #[clap(long)]
    token: Option<String>,

    /// Report interval in seconds
    #[clap(short, long, default_value_t = 10)]
    report_interval_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(rename = "type")]
    msg_type: String,
    message: Option<String>,
}

#[derive(Default)]
struct Stats {
    counts: HashMap<String, u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    // Phase 1: the initial snapshot must arrive without any request.
    let mut seen = Vec::new();
    for _ in 0..3 {
        let msg = read
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("server closed before initial snapshot"))??;
        let parsed: InboundMessage = serde_json::from_str(msg.to_text()?)?;
        seen.push(parsed.msg_type);
    }
    println!("Initial snapshot received: {:?}", seen);
    assert_eq!(seen, vec!["machine_data", "tool_data", "axis_data"]);

    // Phase 2: on-demand queries before authenticate must be rejected.
    write
        .send(Message::text(json!({"type": "get_tool_data"}).to_string()))
        .await?;
    let reply = wait_for_type(&mut read, "error").await?;
    println!(
        "Pre-auth get_tool_data rejected: {}",
        reply.message.as_deref().unwrap_or("")
    );

    // Phase 3: authenticate and query, when a token was supplied.
    if let Some(token) = &args.token {
        write
            .send(Message::text(
                json!({"type": "authenticate", "token": token}).to_string(),
            ))
            .await?;
        // A successful authenticate re-sends the snapshot; an invalid
        // token yields an error message.
        for query in ["get_machine_data", "get_tool_data", "get_axis_data"] {
            write
                .send(Message::text(json!({"type": query}).to_string()))
                .await?;
        }
        println!("Authenticated phase requests sent.");
    } else {
        println!("No --token given, skipping the authenticated phase.");
    }

    // Phase 4: count pushed messages per type and report periodically.
    let stats = Arc::new(Mutex::new(Stats::default()));

    let stats_reporter = Arc::clone(&stats);
    let report_interval = args.report_interval_seconds;
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_secs(report_interval)).await;
            let mut data = stats_reporter.lock().unwrap();
            let mut counts: Vec<(String, u64)> = data.counts.drain().collect();
            counts.sort();
            println!("--- messages per {}s ---", report_interval);
            for (msg_type, count) in counts {
                println!("{:>14}: {}", msg_type, count);
            }
        }
    });

    while let Some(Ok(msg)) = read.next().await {
        if let Ok(text) = msg.to_text() {
            if let Ok(parsed) = serde_json::from_str::<InboundMessage>(text) {
                let mut data = stats.lock().unwrap();
                *data.counts.entry(parsed.msg_type).or_insert(0) += 1;
            }
        }
    }

    println!("Server closed the connection.");
    Ok(())
}

/// Reads until a message of the wanted type arrives, skipping the
/// periodic pushes that interleave with replies.
async fn wait_for_type(
    read: &mut (impl Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
    wanted: &str,
) -> anyhow::Result<InboundMessage> {
    loop {
        let msg = read
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("connection closed while waiting for {wanted}"))??;
        if let Ok(text) = msg.to_text() {
            if let Ok(parsed) = serde_json::from_str::<InboundMessage>(text) {
                if parsed.msg_type == wanted {
                    return Ok(parsed);
                }
            }
        }
    }
}
