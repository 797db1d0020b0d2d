//! Blob storage boundary.
//!
//! The codec's collaborator is anything that can store named blobs: the
//! `BlobStore` trait is the whole contract. `PngStore` is the glue that turns
//! any such store into a payload store, encoding on `put` and decoding on
//! `get`, with the minimum-size padding accommodation applied symmetrically
//! on both paths.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::encode::EncodeOptions;
use crate::error::{CodecError, Result};
use crate::{decode, encode_with, padding};

pub trait BlobStore {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
    fn get(&self, name: &str) -> Result<Vec<u8>>;
    fn list(&self) -> Result<BTreeSet<String>>;
    /// Returns whether a blob was actually removed.
    fn delete(&mut self, name: &str) -> Result<bool>;
}

/// In-memory store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(name)
            .cloned()
            .ok_or_else(|| CodecError::NotFound(name.to_owned()))
    }

    fn list(&self) -> Result<BTreeSet<String>> {
        Ok(self.blobs.keys().cloned().collect())
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        Ok(self.blobs.remove(name).is_some())
    }
}

/// Directory-backed store: one `.png` file per blob.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.png"))
    }
}

impl BlobStore for DirStore {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.blob_path(name), bytes)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.blob_path(name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CodecError::NotFound(name.to_owned()),
            _ => CodecError::Io(e),
        })
    }

    fn list(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "png")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.insert(stem.to_owned());
            }
        }
        Ok(names)
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        match fs::remove_file(self.blob_path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub encode: EncodeOptions,
    /// Zero bytes prepended to every payload before encoding and stripped
    /// after decoding. Zero disables the accommodation.
    pub pad_len: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            encode: EncodeOptions::default(),
            pad_len: padding::MIN_IMAGE_PAD,
        }
    }
}

/// Stores payloads in an inner blob store as PNG containers.
pub struct PngStore<S> {
    inner: S,
    options: StoreOptions,
}

impl<S: BlobStore> PngStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_options(inner, StoreOptions::default())
    }

    pub fn with_options(inner: S, options: StoreOptions) -> Self {
        Self { inner, options }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BlobStore> BlobStore for PngStore<S> {
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let padded = padding::pad_prefix(bytes, self.options.pad_len);
        let container = encode_with(&padded, &self.options.encode)?;
        debug!(
            name,
            payload = bytes.len(),
            container = container.len(),
            "storing payload as PNG"
        );
        self.inner.put(name, &container)
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let container = self.inner.get(name)?;
        let padded = decode(&container)?;
        padding::strip_prefix(&padded, self.options.pad_len)
    }

    fn list(&self) -> Result<BTreeSet<String>> {
        self.inner.list()
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        self.inner.delete(name)
    }
}
