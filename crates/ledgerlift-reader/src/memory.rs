//! In-memory containers
//!
//! Tables are built up front and served back as [`Record`]s. Blob fields
//! expose exactly the access capabilities they were configured with, so the
//! extraction fallbacks can be exercised without a real container file.

use crate::field_size::{FieldSizeResolver, FieldSpec};
use ledgerlift_domain::{
    BlobAccessError, BlobHandle, BlobValue, Container, ContainerSource, FieldValue, ReaderError,
    Record, ScalarValue, Table,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Behaviour of one blob access capability
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Access {
    /// The capability does not exist on this handle
    Absent,
    /// The capability returns the blob content
    #[default]
    Available,
    /// The capability exists but fails with the given message
    Failing(String),
}

impl Access {
    fn run<T>(&self, produce: impl FnOnce() -> T) -> Option<Result<T, BlobAccessError>> {
        match self {
            Access::Absent => None,
            Access::Available => Some(Ok(produce())),
            Access::Failing(message) => Some(Err(BlobAccessError::Read(message.clone()))),
        }
    }
}

/// Capability switches of a [`MemoryBlob`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobAccess {
    /// Direct value accessor
    pub value: Access,
    /// Iteration protocol
    pub chunks: Access,
    /// Raw byte buffer
    pub bytes: Access,
    /// String coercion
    pub coerce: Access,
    /// Internal storage buffer
    pub internal: Access,
}

impl BlobAccess {
    /// Every capability present and working
    pub fn all() -> Self {
        Self::default()
    }

    /// No capability at all
    pub fn none() -> Self {
        Self {
            value: Access::Absent,
            chunks: Access::Absent,
            bytes: Access::Absent,
            coerce: Access::Absent,
            internal: Access::Absent,
        }
    }

    /// Only raw byte-buffer access
    pub fn bytes_only() -> Self {
        Self {
            bytes: Access::Available,
            ..Self::none()
        }
    }
}

/// A blob held in memory
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    data: BlobValue,
    declared_len: usize,
    access: BlobAccess,
    chunk_size: usize,
}

impl MemoryBlob {
    /// Blob whose reader already yields text
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            declared_len: text.len(),
            data: BlobValue::Text(text),
            access: BlobAccess::all(),
            chunk_size: 64,
        }
    }

    /// Blob carrying raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            declared_len: bytes.len(),
            data: BlobValue::Bytes(bytes),
            access: BlobAccess::all(),
            chunk_size: 64,
        }
    }

    /// Restrict or break capabilities
    pub fn with_access(mut self, access: BlobAccess) -> Self {
        self.access = access;
        self
    }

    /// Override the declared length
    pub fn with_declared_len(mut self, len: usize) -> Self {
        self.declared_len = len;
        self
    }

    /// Size of the pieces yielded by iteration
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Current capability switches
    pub fn access(&self) -> &BlobAccess {
        &self.access
    }

    fn raw(&self) -> Vec<u8> {
        match &self.data {
            BlobValue::Text(s) => s.as_bytes().to_vec(),
            BlobValue::Bytes(b) => b.clone(),
        }
    }

    fn pieces(&self) -> Vec<BlobValue> {
        match &self.data {
            BlobValue::Bytes(bytes) => bytes
                .chunks(self.chunk_size)
                .map(|c| BlobValue::Bytes(c.to_vec()))
                .collect(),
            BlobValue::Text(text) => {
                let chars: Vec<char> = text.chars().collect();
                chars
                    .chunks(self.chunk_size)
                    .map(|c| BlobValue::Text(c.iter().collect()))
                    .collect()
            }
        }
    }
}

impl BlobHandle for MemoryBlob {
    fn len(&self) -> usize {
        self.declared_len
    }

    fn value(&self) -> Option<Result<BlobValue, BlobAccessError>> {
        self.access.value.run(|| self.data.clone())
    }

    fn chunks(
        &self,
    ) -> Option<Box<dyn Iterator<Item = Result<BlobValue, BlobAccessError>> + '_>> {
        match &self.access.chunks {
            Access::Absent => None,
            Access::Available => Some(Box::new(
                self.pieces().into_iter().map(Ok::<_, BlobAccessError>),
            )),
            Access::Failing(message) => Some(Box::new(std::iter::once(Err(
                BlobAccessError::Read(message.clone()),
            )))),
        }
    }

    fn bytes(&self) -> Option<Result<Vec<u8>, BlobAccessError>> {
        self.access.bytes.run(|| self.raw())
    }

    fn coerce_string(&self) -> Option<Result<String, BlobAccessError>> {
        self.access.coerce.run(|| match &self.data {
            BlobValue::Text(s) => s.clone(),
            BlobValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        })
    }

    fn internal_buffer(&self) -> Option<Result<Vec<u8>, BlobAccessError>> {
        self.access.internal.run(|| self.raw())
    }
}

/// A field value stored in a [`MemoryTable`]
#[derive(Debug, Clone)]
pub enum MemoryValue {
    /// Decoded scalar
    Scalar(ScalarValue),
    /// Blob
    Blob(MemoryBlob),
}

impl From<ScalarValue> for MemoryValue {
    fn from(value: ScalarValue) -> Self {
        MemoryValue::Scalar(value)
    }
}

impl From<MemoryBlob> for MemoryValue {
    fn from(blob: MemoryBlob) -> Self {
        MemoryValue::Blob(blob)
    }
}

impl MemoryValue {
    fn to_field(&self) -> FieldValue {
        match self {
            MemoryValue::Scalar(v) => FieldValue::Scalar(v.clone()),
            MemoryValue::Blob(b) => FieldValue::Blob(Box::new(b.clone())),
        }
    }
}

/// One slot of a [`MemoryTable`]
#[derive(Debug, Clone)]
pub enum MemoryRow {
    /// Populated record
    Present(Vec<(String, MemoryValue)>),
    /// Deleted slot
    Tombstone,
    /// Slot whose bytes cannot be decoded
    Corrupt(String),
}

/// A named table of in-memory rows
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    rows: Vec<MemoryRow>,
    schema: Vec<FieldSpec>,
}

impl MemoryTable {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            schema: Vec::new(),
        }
    }

    /// Append a populated row
    pub fn with_row<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MemoryValue>,
    {
        self.push(MemoryRow::Present(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Append a tombstoned slot
    pub fn with_tombstone(mut self) -> Self {
        self.push(MemoryRow::Tombstone);
        self
    }

    /// Append a slot that fails to decode
    pub fn with_corrupt(mut self, reason: impl Into<String>) -> Self {
        self.push(MemoryRow::Corrupt(reason.into()));
        self
    }

    /// Attach a schema declaration
    pub fn with_schema(mut self, schema: Vec<FieldSpec>) -> Self {
        self.schema = schema;
        self
    }

    /// Append a row slot
    pub fn push(&mut self, row: MemoryRow) {
        self.rows.push(row);
    }

    /// Declared schema, possibly empty
    pub fn schema(&self) -> &[FieldSpec] {
        &self.schema
    }

    /// Record width of the declared schema
    pub fn record_width(&self, resolver: &dyn FieldSizeResolver) -> Result<usize, ReaderError> {
        resolver.record_width(&self.schema)
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn record(&self, index: usize) -> Result<Record, ReaderError> {
        let row = self
            .rows
            .get(index)
            .ok_or_else(|| ReaderError::IndexOutOfRange {
                table: self.name.clone(),
                index,
                len: self.rows.len(),
            })?;

        match row {
            MemoryRow::Tombstone => Ok(Record::tombstone(index)),
            MemoryRow::Corrupt(reason) => Err(ReaderError::CorruptRecord {
                table: self.name.clone(),
                index,
                reason: reason.clone(),
            }),
            MemoryRow::Present(fields) => Ok(Record::new(
                index,
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_field()))
                    .collect(),
            )),
        }
    }
}

/// An opened in-memory container
///
/// Sets its release flag when dropped.
#[derive(Debug)]
pub struct MemoryContainer {
    tables: Vec<MemoryTable>,
    released: Arc<AtomicBool>,
}

impl MemoryContainer {
    /// Wrap a set of tables
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self {
            tables,
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Container for MemoryContainer {
    fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn table(&self, name: &str) -> Option<&dyn Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map(|t| t as &dyn Table)
    }
}

impl Drop for MemoryContainer {
    fn drop(&mut self) {
        debug!(tables = self.tables.len(), "Releasing in-memory container");
        self.released.store(true, Ordering::SeqCst);
    }
}

/// A [`ContainerSource`] over in-memory tables
#[derive(Debug, Clone)]
pub struct MemorySource {
    description: String,
    tables: Vec<MemoryTable>,
    open_error: Option<String>,
    released: Arc<AtomicBool>,
    opens: Arc<AtomicUsize>,
}

impl MemorySource {
    /// Create a source that opens to the given tables
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self {
            description: "memory".to_string(),
            tables,
            open_error: None,
            released: Arc::new(AtomicBool::new(false)),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every open attempt fail
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            open_error: Some(reason.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Set the description reported in run metadata
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the last opened container has been released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ContainerSource for MemorySource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn open(&self) -> Result<Box<dyn Container>, ReaderError> {
        if let Some(reason) = &self.open_error {
            return Err(ReaderError::Open(reason.clone()));
        }

        self.released.store(false, Ordering::SeqCst);
        self.opens.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryContainer {
            tables: self.tables.clone(),
            released: Arc::clone(&self.released),
        }))
    }
}
