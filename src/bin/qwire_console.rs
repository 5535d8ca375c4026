//! qwire Remote Console
//!
//! Interactive prompt: setiap baris dikirim sebagai sync query dan
//! hasilnya dicetak. Keluar dengan `\\`.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin qwire_console -- localhost 5000
//! ```

use std::io::{self, BufRead, Write};

use qwire::network::{Connection, ConnectionOptions};
use qwire::{Error, Value};
use tracing_subscriber::EnvFilter;

const MAX_TABLE_ROWS: usize = 20;

struct ConsoleConfig {
    host: String,
    port: u16,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
        }
    }
}

fn print_result(value: &Value) {
    match value {
        Value::Null => println!("::"),
        Value::Table(table) => print!("{}", table.render(MAX_TABLE_ROWS)),
        other => println!("{other}"),
    }
}

fn run_console(config: ConsoleConfig) -> Result<(), Error> {
    let mut q = Connection::new(ConnectionOptions::default().host(config.host).port(config.port));
    q.open()?;
    println!("conn: {}  protocol: {}", q, q.protocol_version());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Q)");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line == "\\\\" {
            break;
        }

        match q.sync(&line, &[]) {
            Ok(result) => print_result(&result),
            Err(Error::Remote(message)) => println!("`{message}"),
            Err(e) => return Err(e),
        }
    }

    q.close();
    Ok(())
}

fn parse_args() -> ConsoleConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = ConsoleConfig::default();

    if args.iter().any(|a| a == "--help") {
        println!("qwire Remote Console\n");
        println!("Usage: qwire_console [HOST] [PORT]\n");
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
    if let Err(e) = run_console(config) {
        eprintln!("❌ Console error: {e}");
        std::process::exit(1);
    }
}
