//! Trait definitions for the container reader boundary
//!
//! These traits define what the pipeline consumes from the low-level reader.
//! Implementations live in other crates (ledgerlift-reader, or a proprietary
//! reader wrapping the real file format).

use crate::error::ReaderError;
use crate::record::Record;

/// An ordered, randomly indexable sequence of records
///
/// The length is fixed for the duration of a run.
pub trait Table {
    /// Table name as declared in the container schema
    fn name(&self) -> &str;

    /// Number of record slots, tombstones included
    fn len(&self) -> usize;

    /// Whether the table has no slots
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the record at `index`
    fn record(&self, index: usize) -> Result<Record, ReaderError>;
}

/// An opened, read-only container
///
/// Dropping the container releases its backing resources.
pub trait Container {
    /// Names of all tables in schema order
    fn table_names(&self) -> Vec<String>;

    /// Borrow a table by exact name
    fn table(&self, name: &str) -> Option<&dyn Table>;
}

/// Something that can open a container
///
/// Opening is the only fatal step of an extraction run.
pub trait ContainerSource {
    /// Human-readable description used in run metadata and logs
    fn describe(&self) -> String;

    /// Open the container for reading
    fn open(&self) -> Result<Box<dyn Container>, ReaderError>;
}
