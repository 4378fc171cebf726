use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use crate::error::MetopError;
use crate::records::common::read_fully;

/// A seekable byte source that can be moved into a [`SharedStream`].
pub trait ByteSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteSource for T {}

/// The product's single byte stream, shared by every reader.
///
/// Each seek+read pair runs under one lock, so concurrent readers never
/// observe each other's position.
pub struct SharedStream {
    inner: Mutex<Box<dyn ByteSource>>,
    len: u64,
}

impl std::fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<SharedStream len: {}>", self.len)
    }
}

impl SharedStream {
    pub fn new(mut source: Box<dyn ByteSource>) -> Result<Self, MetopError> {
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        Ok(SharedStream {
            inner: Mutex::new(source),
            len,
        })
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read `length` bytes starting at `offset` as one atomic seek+read.
    pub fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, MetopError> {
        let mut source = self.inner.lock().map_err(|_| MetopError::StreamPoisoned)?;
        source.seek(SeekFrom::Start(offset))?;
        read_fully(&mut **source, length, offset)
    }

    pub fn read_u8_at(&self, offset: u64) -> Result<u8, MetopError> {
        Ok(self.read_range(offset, 1)?[0])
    }

    /// Hands the source back, ending shared access.
    pub fn into_inner(self) -> Result<Box<dyn ByteSource>, MetopError> {
        self.inner.into_inner().map_err(|_| MetopError::StreamPoisoned)
    }
}
