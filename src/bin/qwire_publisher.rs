//! qwire Publisher
//!
//! Mengirim random `ask` rows ke `.u.upd` setiap 500 ms sampai Enter ditekan.
//! PERINGATAN: men-overwrite `.u.upd` di q process tujuan.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin qwire_publisher -- localhost 5001
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Local;
use qwire::core::Time;
use qwire::network::{Connection, ConnectionOptions};
use qwire::{Error, Value};
use rand::Rng;
use tracing_subscriber::EnvFilter;

const PUBLISH_INTERVAL: Duration = Duration::from_millis(500);

struct PublisherConfig {
    host: String,
    port: u16,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5001,
        }
    }
}

/// `(time list; instrument symbols; source symbols; real list)`
fn ask_data(rng: &mut impl Rng) -> Value {
    let rows = rng.gen_range(1..=10);
    let now = Time::from(Local::now().time());

    let mut times = Vec::with_capacity(rows);
    let mut instruments = Vec::with_capacity(rows);
    let mut sources = Vec::with_capacity(rows);
    let mut prices = Vec::with_capacity(rows);
    for _ in 0..rows {
        times.push(now);
        instruments.push(format!("INSTR_{}", rng.gen_range(0..100)));
        sources.push("qwire".to_string());
        prices.push(rng.gen::<f32>() * rng.gen_range(0..100) as f32);
    }

    Value::List(vec![
        Value::TimeList(times),
        Value::SymbolList(instruments),
        Value::SymbolList(sources),
        Value::RealList(prices),
    ])
}

fn run_publisher(config: PublisherConfig) -> Result<(), Error> {
    let mut q = Connection::new(ConnectionOptions::default().host(config.host).port(config.port));
    q.open()?;
    println!("conn: {}  protocol: {}", q, q.protocol_version());
    println!("⚠️  WARNING: this application overwrites .u.upd on the q process");
    println!("Press <ENTER> to close application");

    q.sync(".u.upd:{[x;y] show (x;y)};", &[])?;

    let q = Arc::new(Mutex::new(q));
    let running = Arc::new(AtomicBool::new(true));

    let worker = {
        let q = Arc::clone(&q);
        let running = Arc::clone(&running);
        thread::spawn(move || -> Result<(), Error> {
            let mut rng = rand::thread_rng();
            while running.load(Ordering::Relaxed) {
                let params = [Value::symbol("ask"), ask_data(&mut rng)];
                {
                    let mut q = q
                        .lock()
                        .map_err(|_| Error::Connection("connection lock poisoned".into()))?;
                    q.send_async(".u.upd", &params)?;
                }
                print!(".");
                io::Write::flush(&mut io::stdout()).ok();
                thread::sleep(PUBLISH_INTERVAL);
            }
            Ok(())
        })
    };

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    running.store(false, Ordering::Relaxed);

    match worker.join() {
        Ok(result) => result?,
        Err(_) => return Err(Error::Connection("publisher thread panicked".into())),
    }

    if let Ok(mut q) = q.lock() {
        q.close();
    }
    println!();
    Ok(())
}

fn parse_args() -> PublisherConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = PublisherConfig::default();

    if args.iter().any(|a| a == "--help") {
        println!("qwire Publisher\n");
        println!("Usage: qwire_publisher [HOST] [PORT]\n");
        println!("  HOST   tickerplant host (default: localhost)");
        println!("  PORT   tickerplant port (default: 5001)");
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
    if let Err(e) = run_publisher(config) {
        eprintln!("❌ Publisher error: {e}");
        std::process::exit(1);
    }
}
