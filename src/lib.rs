//! # corekv
//!
//! An embedded, ordered key-value storage engine built on the
//! log-structured-merge (LSM) pattern:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with torn-tail and checksum handling
//! - Red-black tree memtable as the active write buffer
//! - Immutable sorted disk tables (data + dense index + sparse index)
//! - Size-tiered compaction bounding the number of disk tables
//!
//! ## Architecture Overview
//!
//! ```text
//!   Put / Delete                      Get
//!        │                             │
//!        ▼                             ▼
//! ┌─────────────┐              ┌──────────────┐
//! │     WAL     │              │   MemTable   │◄── most recent state
//! │  (append)   │              └──────┬───────┘
//! └──────┬──────┘                     │ miss
//!        │                            ▼
//!        ▼                    ┌───────────────┐
//! ┌─────────────┐   flush     │  Disk Tables  │
//! │  MemTable   │────────────►│ newest→oldest │
//! └─────────────┘             └───────┬───────┘
//!                                     │ count > threshold
//!                                     ▼
//!                              ┌─────────────┐
//!                              │  Compaction │
//!                              └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use corekv::{Config, Engine};
//!
//! let config = Config::builder().data_dir("./db").build();
//! let engine = Engine::open(config).unwrap();
//!
//! engine.put(b"hello", b"world").unwrap();
//! assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
//! engine.delete(b"hello").unwrap();
//! assert_eq!(engine.get(b"hello").unwrap(), None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod atomicfile;
pub mod wal;
pub mod memtable;
pub mod table;
pub mod manifest;
pub mod compaction;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of corekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
