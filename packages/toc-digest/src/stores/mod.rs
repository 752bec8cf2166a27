//! Output table implementations.
//!
//! Available backends:
//! - `CsvTable` - Append-only CSV file (persistent, resumable)
//! - `MemoryTable` - In-memory rows (testing and development)

pub mod csv_table;
pub mod memory;

pub use csv_table::CsvTable;
pub use memory::MemoryTable;
