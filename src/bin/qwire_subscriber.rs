//! qwire Subscriber
//!
//! Mendaftarkan timer di q process yang mengirim `.z.p` ke client setiap
//! 100 ms, lalu mencetak setiap message yang diterima listener.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin qwire_subscriber -- localhost 5000
//! ```

use std::io;
use std::sync::Arc;

use qwire::network::{CallbackConnection, ConnectionOptions, MessageHandler};
use qwire::protocol::Message;
use qwire::{Error, Value};
use tracing_subscriber::EnvFilter;

struct SubscriberConfig {
    host: String,
    port: u16,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
        }
    }
}

struct PrintHandler;

impl MessageHandler for PrintHandler {
    fn on_data(&self, message: Message) {
        println!("📨 Asynchronous message received: {}", message.data);
        println!(
            "   message type: {} size: {} compressed: {} endianness: {:?}",
            message.kind, message.size, message.compressed, message.endianness
        );
    }

    fn on_error(&self, error: &Error) {
        eprintln!("Error received via callback: {error}");
    }
}

fn run_subscriber(config: SubscriberConfig) -> Result<(), Error> {
    let options = ConnectionOptions::default().host(config.host).port(config.port);
    let mut q = CallbackConnection::new(options, Arc::new(PrintHandler));
    q.open()?;
    println!("conn: {}  protocol: {}", *q, q.protocol_version());
    println!("Press <ENTER> to close application");

    q.sync("sub:{[x] .sub.h: .z.w }", &[])?;
    q.sync(".z.ts:{ (neg .sub.h) .z.p}", &[])?;
    q.sync("value \"\\\\t 100\"", &[])?;

    q.start_listener()?;
    q.send_async("sub", &[Value::Long(0)])?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    // timer dimatikan lewat async; listener masih memegang stream
    q.send_async("value \"\\\\t 0\"", &[])?;
    q.stop_listener();
    q.close();
    Ok(())
}

fn parse_args() -> SubscriberConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = SubscriberConfig::default();

    if args.iter().any(|a| a == "--help") {
        println!("qwire Subscriber\n");
        println!("Usage: qwire_subscriber [HOST] [PORT]\n");
        println!("  HOST   q process host (default: localhost)");
        println!("  PORT   q process port (default: 5000)");
        std::process::exit(0);
    }

    if let Some(host) = args.first() {
        config.host = host.clone();
    }
    if let Some(port) = args.get(1) {
        config.port = port.parse().unwrap_or(config.port);
    }
    config
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = parse_args();
    if let Err(e) = run_subscriber(config) {
        eprintln!("❌ Subscriber error: {e}");
        std::process::exit(1);
    }
}
