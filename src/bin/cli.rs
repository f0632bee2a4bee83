//! EmberKV CLI Client
//!
//! One-shot command-line client: sends a single command line over a fresh
//! connection and prints the response.
//!
//! Uses a single TCP stream for sequential write-then-read: the command
//! bytes go straight to the stream and only the response read goes through a
//! BufReader, so no cloned socket handles are involved.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use emberkv::protocol::{encode_command, parse_response, Command, Response};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV cache")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7171")]
    server: String,

    /// Connection timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value
    Put {
        key: String,
        value: String,

        /// Expiration in seconds (0 = never)
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Get a value by key
    Get { key: String },

    /// Delete a key
    Del { key: String },

    /// Check whether a key exists
    Exists { key: String },
}

fn main() {
    let args = Args::parse();

    let command = match &args.command {
        Commands::Put { key, value, ttl } => Command::Put {
            key: key.clone(),
            value: value.clone(),
            ttl: *ttl,
        },
        Commands::Get { key } => Command::Get { key: key.clone() },
        Commands::Del { key } => Command::Delete { key: key.clone() },
        Commands::Exists { key } => Command::Exists { key: key.clone() },
    };

    let timeout = Duration::from_millis(args.timeout);
    let addr = match args.server.to_socket_addrs().ok().and_then(|mut a| a.next()) {
        Some(addr) => addr,
        None => {
            eprintln!("Invalid server address: {}", args.server);
            process::exit(1);
        }
    };

    let mut stream = match TcpStream::connect_timeout(&addr, timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {e}", args.server);
            process::exit(1);
        }
    };

    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));
    let _ = stream.set_nodelay(true);

    // Write the command line directly to the stream
    let line = encode_command(&command);
    if let Err(e) = stream.write_all(line.as_bytes()).and_then(|_| stream.flush()) {
        eprintln!("Failed to send command: {e}");
        process::exit(1);
    }

    // Read the one-line response through a reader
    let mut reader = BufReader::new(&stream);
    let mut reply = String::new();
    match reader.read_line(&mut reply) {
        Ok(0) => {
            eprintln!("Server closed the connection");
            process::exit(1);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("Failed to read response: {e}");
            process::exit(1);
        }
    }

    match parse_response(&reply) {
        Ok(Response::Ok(Some(payload))) => println!("{payload}"),
        Ok(Response::Ok(None)) => println!("OK"),
        Ok(Response::Error(message)) => {
            eprintln!("ERROR: {message}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Malformed response: {e}");
            process::exit(1);
        }
    }
}
