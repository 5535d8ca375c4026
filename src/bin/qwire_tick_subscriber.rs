//! qwire Tick Subscriber
//!
//! Subscribe ke tabel `trade` di tickerplant lewat `.u.sub`, lalu cetak
//! setiap row dari message `(`upd; `trade; table)`.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin qwire_tick_subscriber -- localhost 17010
//! ```

use std::io;
use std::sync::Arc;

use qwire::network::{CallbackConnection, ConnectionOptions, MessageHandler};
use qwire::protocol::Message;
use qwire::{Error, Value};
use tracing_subscriber::EnvFilter;

struct TickConfig {
    host: String,
    port: u16,
    table: String,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 17010,
            table: "trade".to_string(),
        }
    }
}

struct UpdHandler;

impl MessageHandler for UpdHandler {
    fn on_data(&self, message: Message) {
        let Some(args) = message.data.as_list() else {
            return;
        };
        if let [name, _, Value::Table(table)] = args {
            if name.as_str() == Some("upd") {
                for row in table.rows() {
                    println!("{row}");
                }
            }
        }
    }

    fn on_error(&self, error: &Error) {
        eprintln!("Error received via callback: {error}");
    }
}

fn run_tick_subscriber(config: TickConfig) -> Result<(), Error> {
    let options = ConnectionOptions::default().host(config.host).port(config.port);
    let mut q = CallbackConnection::new(options, Arc::new(UpdHandler));
    q.open()?;
    println!("conn: {}  protocol: {}", *q, q.protocol_version());
    println!("Press <ENTER> to close application");

    let response = q.sync(
        ".u.sub",
        &[Value::symbol(config.table.as_str()), Value::symbol("")],
    )?;
    if let Some(model) = response.as_list().and_then(|r| r.get(1)).and_then(Value::as_table) {
        println!("📋 Subscribed to `{}: {}", config.table, model.columns().join(" "));
    }

    q.start_listener()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    q.stop_listener();
    q.close();
    Ok(())
}

fn parse_args() -> TickConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = TickConfig::default();

    if args.iter().any(|a| a == "--help") {
        println!("qwire Tick Subscriber\n");
        println!("Usage: qwire_tick_subscriber [HOST] [PORT] [TABLE]\n");
        println!("  HOST    tickerplant host (default: localhost)");
        println!("  PORT    tickerplant port (default: 17010)");
        println!("  TABLE   table to subscribe (default: trade)");
        std::process::exit(0);
    }

    if let Some(host) = args.first() {
        config.host = host.clone();
    }
    if let Some(port) = args.get(1) {
        config.port = port.parse().unwrap_or(config.port);
    }
    if let Some(table) = args.get(2) {
        config.table = table.clone();
    }
    config
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = parse_args();
    if let Err(e) = run_tick_subscriber(config) {
        eprintln!("❌ Tick subscriber error: {e}");
        std::process::exit(1);
    }
}
