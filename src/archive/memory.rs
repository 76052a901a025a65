use std::collections::HashMap;

use super::Archive;
use crate::error::{Error, Result};

/// An in-memory archive, for callers that have already unpacked the
/// container (or for building fixtures).
///
/// Entry order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, path: impl Into<String>, data: Vec<u8>) {
        let path = path.into();
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = data,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, data));
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_entry(mut self, path: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Archive for MemoryArchive {
    fn has_entry(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.index
            .get(path)
            .map(|&i| self.entries[i].1.clone())
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }

    fn entry_paths(&self) -> Vec<String> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }
}
