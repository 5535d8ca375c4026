//! qwire Async Query
//!
//! Mendefinisikan `asynchMult` di q process, lalu mengirim 10 async call.
//! q menjawab setiap call dengan async message `` `queryid`result!(id;a*b) ``
//! yang dicetak oleh listener.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin qwire_async_query -- localhost 5000
//! ```

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use qwire::network::{CallbackConnection, ConnectionOptions, MessageHandler};
use qwire::protocol::Message;
use qwire::{Error, Value};
use rand::Rng;
use tracing_subscriber::EnvFilter;

const QUERY_COUNT: i64 = 10;
const MAX_TABLE_ROWS: usize = 20;

struct AsyncQueryConfig {
    host: String,
    port: u16,
}

impl Default for AsyncQueryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
        }
    }
}

struct ResultPrinter;

impl MessageHandler for ResultPrinter {
    fn on_data(&self, message: Message) {
        match &message.data {
            Value::Null => println!("::"),
            Value::Table(table) => print!("{}", table.render(MAX_TABLE_ROWS)),
            other => println!("{other}"),
        }
    }

    fn on_error(&self, error: &Error) {
        eprintln!("Error received via callback: {error}");
    }
}

fn run_async_query(config: AsyncQueryConfig) -> Result<(), Error> {
    let options = ConnectionOptions::default().host(config.host).port(config.port);
    let mut q = CallbackConnection::new(options, Arc::new(ResultPrinter));
    q.open()?;
    println!("conn: {}  protocol: {}", *q, q.protocol_version());
    println!("Press <ENTER> to close application");

    q.sync(
        "asynchMult:{[queryid;a;b] res:a*b; (neg .z.w)(`queryid`result!(queryid;res)) }",
        &[],
    )?;
    q.start_listener()?;

    let mut rng = rand::thread_rng();
    for i in 0..QUERY_COUNT {
        let a: i64 = rng.gen_range(0..20);
        let b: i64 = rng.gen_range(0..20);
        println!("🚀 Async call with queryid={i} with arguments={a},{b}");
        q.send_async("asynchMult", &[Value::Long(i), Value::Long(a), Value::Long(b)])?;
    }

    thread::sleep(Duration::from_secs(2));
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    q.stop_listener();
    q.close();
    Ok(())
}

fn parse_args() -> AsyncQueryConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = AsyncQueryConfig::default();

    if args.iter().any(|a| a == "--help") {
        println!("qwire Async Query\n");
        println!("Usage: qwire_async_query [HOST] [PORT]\n");
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
    if let Err(e) = run_async_query(config) {
        eprintln!("❌ Async query error: {e}");
        std::process::exit(1);
    }
}
