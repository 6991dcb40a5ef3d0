//! redwire CLI Client
//!
//! Sends one command to a RESP server and prints the reply.

use clap::{Parser, ValueEnum};
use redwire::{ClientConfig, Connection, Encoding, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// redwire CLI
#[derive(Parser, Debug)]
#[command(name = "redwire-cli")]
#[command(about = "Send a single command to a RESP server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// How the command is laid out on the wire
    #[arg(short, long, value_enum, default_value = "multi-bulk")]
    encoding: WireEncoding,

    /// Read timeout in milliseconds (0 = wait forever)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Command and arguments, e.g. `SET key value`
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WireEncoding {
    Inline,
    Bulk,
    MultiBulk,
}

impl From<WireEncoding> for Encoding {
    fn from(e: WireEncoding) -> Self {
        match e {
            WireEncoding::Inline => Encoding::Inline,
            WireEncoding::Bulk => Encoding::Bulk,
            WireEncoding::MultiBulk => Encoding::MultiBulk,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,redwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .host(&args.host)
        .port(args.port)
        .read_timeout_ms(args.timeout_ms)
        .build();

    let mut conn = match Connection::open(config) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to connect to {}:{}: {}", args.host, args.port, e);
            std::process::exit(1);
        }
    };

    // Words in length-prefixed positions are sent as binary
    let encoding = Encoding::from(args.encoding);
    let last = args.command.len() - 1;
    let values: Vec<Value<'_>> = args
        .command
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if encoding != Encoding::Inline && (i == last || encoding == Encoding::MultiBulk) {
                Value::binary(word.as_bytes())
            } else {
                Value::text(word)
            }
        })
        .collect();

    match conn.request_encoded(encoding, &values) {
        Ok(reply) => println!("{}", reply),
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
