//! WAL framing demonstration
//!
//! Writes a handful of framed records to a log file, including one
//! whose stored checksum is deliberately wrong, then reads the file
//! back, showing how the length + CRC32 framing detects corruption.
//! Illustration only; the engine performs the same dance during
//! recovery.

use std::fs::{self, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;

use clap::Parser;

use corekv::wal::{read_record, write_record, ReadRecord};

/// Demonstrate corekv's WAL record framing and checksum verification
#[derive(Parser, Debug)]
#[command(name = "wal-demo")]
#[command(about = "Write and verify checksummed WAL records")]
struct Args {
    /// Log file to write (removed afterwards unless --keep)
    #[arg(short, long, default_value = "example.log")]
    file: PathBuf,

    /// Keep the log file instead of deleting it at the end
    #[arg(long)]
    keep: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    if !args.keep {
        let _ = fs::remove_file(&args.file);
    }
}

fn run(args: &Args) -> corekv::Result<()> {
    let messages: [&[u8]; 2] = [
        b"This is the first log message.",
        b"Another log entry, longer this time, to demonstrate multiple writes.",
    ];

    println!("--- Writing Log Entries ---");

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.file)?;

    for message in messages {
        println!("writing: {:?}", String::from_utf8_lossy(message));
        write_record(&mut file, message)?;
    }

    // A frame whose stored checksum belongs to different bytes: the
    // reader must flag it rather than hand the payload back.
    let corrupted: &[u8] = b"This message will fail checksum verification.";
    println!("writing (corrupted): {:?}", String::from_utf8_lossy(corrupted));
    let wrong_crc = crc32fast::hash(b"WRONG CHECKSUM DATA");
    let mut frame = Vec::with_capacity(8 + corrupted.len());
    frame.extend_from_slice(&(corrupted.len() as u32).to_le_bytes());
    frame.extend_from_slice(&wrong_crc.to_le_bytes());
    frame.extend_from_slice(corrupted);
    file.write_all(&frame)?;
    file.sync_all()?;

    println!("\n--- Reading Log Entries ---");

    let mut reader = BufReader::new(fs::File::open(&args.file)?);
    for entry_num in 1.. {
        match read_record(&mut reader)? {
            ReadRecord::Record(payload) => {
                println!("\nentry {entry_num}:");
                println!("  size: {} bytes", payload.len());
                println!("  data: {:?}", String::from_utf8_lossy(&payload));
                println!("  checksum match: data is intact");
            }
            ReadRecord::Corrupt { stored, computed } => {
                println!("\nentry {entry_num}:");
                println!("  stored checksum:   0x{stored:08x}");
                println!("  computed checksum: 0x{computed:08x}");
                println!("  checksum mismatch: data may be corrupted!");
                break;
            }
            ReadRecord::Torn => {
                println!("\nentry {entry_num}: incomplete record (crash tail)");
                break;
            }
            ReadRecord::Oversized { len } => {
                println!("\nentry {entry_num}: length field {len} exceeds any valid record");
                break;
            }
            ReadRecord::Eof => break,
        }
    }

    println!("\n--- Done ---");
    Ok(())
}
