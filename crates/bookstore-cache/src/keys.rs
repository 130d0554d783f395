//! Cache key derivation.
//!
//! Layout: `<namespace>:<kind>:<hex sha256>`. The digest covers a
//! length-prefixed encoding of the normalized query fields, so two distinct
//! queries never share a key while blank and missing fields are
//! indistinguishable. Every key of a namespace shares the `<namespace>:`
//! prefix, which is what invalidation scans for.

use std::fmt;

use sha2::{Digest, Sha256};

use bookstore_core::model::{BookFilter, non_blank};

const MISSING: u8 = 0x00;
const PRESENT: u8 = 0x01;

/// Resource type a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Author lists and single authors.
    Authors,
    /// Book lists and single books.
    Books,
}

impl Namespace {
    /// Namespace label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Books => "books",
        }
    }

    /// Prefix shared by every key in the namespace.
    #[must_use]
    pub fn prefix(self) -> String {
        format!("{}:", self.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A filtered collection.
    List,
    /// A single record by id.
    Id,
}

impl QueryKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Id => "id",
        }
    }
}

/// A derived cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for `parts` queried as `kind` within `namespace`.
    #[must_use]
    pub fn derive(namespace: Namespace, kind: QueryKind, parts: &[Option<&str>]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            match non_blank(*part) {
                Some(value) => {
                    hasher.update([PRESENT]);
                    hasher.update((value.len() as u64).to_be_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([MISSING]),
            }
        }
        let digest = hex::encode(hasher.finalize());
        Self(format!("{}:{}:{digest}", namespace.as_str(), kind.as_str()))
    }

    /// Key for a filtered book list.
    #[must_use]
    pub fn book_list(filter: &BookFilter) -> Self {
        Self::derive(
            Namespace::Books,
            QueryKind::List,
            &[
                filter.title.as_deref(),
                filter.genre.as_deref(),
                filter.author_id.as_deref(),
            ],
        )
    }

    /// Key for a single book.
    #[must_use]
    pub fn book(id: &str) -> Self {
        Self::derive(Namespace::Books, QueryKind::Id, &[Some(id)])
    }

    /// Key for the full author list.
    #[must_use]
    pub fn author_list() -> Self {
        Self::derive(Namespace::Authors, QueryKind::List, &[])
    }

    /// Key for a single author.
    #[must_use]
    pub fn author(id: &str) -> Self {
        Self::derive(Namespace::Authors, QueryKind::Id, &[Some(id)])
    }

    /// The key as stored in the cache.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
