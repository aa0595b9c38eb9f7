//! Ledgerlift Container Reader
//!
//! Implementations of the container traits from `ledgerlift-domain`, plus the
//! field-size compatibility shim.
//!
//! ## Components
//!
//! - **Field sizes**: [`StrictFieldSizes`] is the stock width table;
//!   [`CompatFieldSizes`] wraps any resolver and tolerates type codes the
//!   stock table does not know
//! - **Memory**: [`MemorySource`] serves tables built in code, with blob
//!   handles whose access capabilities can be switched off or broken
//! - **Fixture**: [`FixtureSource`] loads a container described as JSON
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgerlift_domain::ContainerSource;
//! use ledgerlift_reader::{FixtureSource, ReaderConfig};
//!
//! let source = FixtureSource::new("container.json").with_config(ReaderConfig::default());
//! let container = source.open()?;
//! for name in container.table_names() {
//!     println!("{}", name);
//! }
//! # Ok::<(), ledgerlift_domain::ReaderError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field_size;
pub mod fixture;
pub mod memory;

pub use field_size::{
    CompatFieldSizes, FieldSizeResolver, FieldSpec, ReaderConfig, StrictFieldSizes,
};
pub use fixture::FixtureSource;
pub use memory::{
    Access, BlobAccess, MemoryBlob, MemoryContainer, MemoryRow, MemorySource, MemoryTable,
    MemoryValue,
};
