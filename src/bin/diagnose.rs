//! Diagnostic tool - Check configuration and state file
//!
//! Run with: cargo run --bin diagnose

use spam_radar::state::StateStore;
use spam_radar::Config;
use std::env;

fn main() {
    println!("🔍 SPAM RADAR DIAGNOSTIC CHECK\n");

    let config = Config::from_env();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("REFERENCE_ASSET", "SAND", "Asset whose holders we protect"),
        ("STATE_DIR", "./data", "Where the state file lives"),
        ("FEED_QUERIES", "sandbox,sand", "Alert feed searches at init"),
        ("FEED_PAGE_LIMIT", "100", "Alerts per feed page"),
        ("SCAN_INTERVAL_SECS", "12", "Seconds between polls in watch mode"),
        ("LOG_LEVEL", "info", "tracing filter"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    for (key, url) in [
        ("JSON_RPC_MAINNET", &config.rpc_mainnet),
        ("JSON_RPC_MATIC", &config.rpc_polygon),
    ] {
        println!("  {}: {}", key, redact(url));
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                    VALIDATION                      ");
    println!("═══════════════════════════════════════════════════\n");

    match config.validate() {
        Ok(()) => println!("  ✅ Configuration is valid"),
        Err(e) => println!("  ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                    STATE FILE                      ");
    println!("═══════════════════════════════════════════════════\n");

    let store = config.state_store();
    println!("  Path: {}", store.path().display());

    match store.read() {
        Ok(None) => {
            println!("  📭 No state file yet");
            println!("     → Run `spam-radar init` to seed the scam-token registry");
        }
        Ok(Some(state)) => {
            println!("  ✅ Readable");
            println!("     → Scam tokens: {}", state.scam_tokens.len());
            println!("     → Tracked spammers: {}", state.spammer_addresses.len());
            match state.updated_at_datetime() {
                Some(at) => println!("     → Last update: {}", at.to_rfc3339()),
                None => println!("     → Last update: unknown ({:?})", state.updated_at),
            }
            if state.scam_tokens.is_empty() {
                println!("\n  ⚠️  Registry is empty, nothing will be detected.");
            }
        }
        Err(e) => {
            println!("  ❌ {}", e);
            println!("     → Detection refuses to run on a corrupt state file");
        }
    }

    println!("\n✅ Diagnostic complete!\n");
}

fn redact(url: &str) -> String {
    if url.is_empty() {
        "NOT SET".to_string()
    } else if url.chars().count() > 50 {
        let head: String = url.chars().take(30).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}
