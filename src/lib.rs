//! # LodeKV
//!
//! An embedded key-value store with:
//! - Interchangeable in-memory indexing engines behind one contract
//!   (B-tree, open-addressing hash table, sorted array, std map)
//! - An append-only journal replayed on startup for durability
//! - Single-writer/multi-reader concurrency model
//! - An interactive console and one-shot CLI
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Console / CLI                              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Store                                   │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Journal   │          │ IndexEngine │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐     BTree / HashTable /
//!   │    Codec    │     SortedArray / MapIndex
//!   │  (base64)   │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use lodekv::{Config, EngineKind, Store};
//!
//! let config = Config::builder()
//!     .journal_path("./data/lodekv.journal")
//!     .engine(EngineKind::HashMap)
//!     .build();
//!
//! let store = Store::open(config)?;
//! store.set(b"language", b"rust")?;
//! assert_eq!(&store.get(b"language")?[..], b"rust");
//! store.close()?;
//! # Ok::<(), lodekv::LodeError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod index;
pub mod journal;
pub mod store;
pub mod console;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LodeError, Result};
pub use config::{Config, JournalSyncStrategy, UpdatePolicy};
pub use index::{create_engine, EngineKind, IndexEngine};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LodeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
