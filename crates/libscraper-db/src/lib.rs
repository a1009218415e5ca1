//! Libscraper-DB: Database schema, migrations, and query operations
//!
//! This crate provides durable storage for libscraper using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use libscraper_db::pool::{init_pool, get_conn};
//! use libscraper_db::queries::plugin_data;
//!
//! let pool = init_pool("/var/lib/libscraper/libscraper.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let ledger = plugin_data::get(&conn, "LibraryScraperLin", "unscrapfiles").unwrap();
//! println!("Unresolved: {:?}", ledger);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
