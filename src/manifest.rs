// © 2019 3D Robotics. License: Apache-2.0
//! Entries, attributes, and the validated, ordered `Manifest` the
//! [`crate::encoder`] drives (§3, §4.5).

use chrono::{DateTime, Utc};

use crate::error::{EntryError, ManifestError};
use crate::source::SourceDescriptor;

/// POSIX file permission bits plus optional ownership, carried into the
/// Central File Header's external attributes and Info-ZIP Unix extra field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attributes {
    pub mode: u16,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub setuid: bool,
    pub setgid: bool,
    pub sticky: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes {
            mode: 0o644,
            uid: None,
            gid: None,
            setuid: false,
            setgid: false,
            sticky: false,
        }
    }
}

impl Attributes {
    fn validate(&self) -> Result<(), EntryError> {
        if self.mode > 0o777 {
            return Err(EntryError::InvalidAttributes);
        }
        if self.uid.is_some() != self.gid.is_some() {
            return Err(EntryError::InvalidAttributes);
        }
        Ok(())
    }
}

/// Deflate compression level, mirroring zlib's `0..=9` scale plus the
/// symbolic aliases spec.md §6 names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Level {
    None,
    BestSpeed,
    #[default]
    Default,
    BestCompression,
    Numeric(u8),
}

impl Level {
    pub(crate) fn to_flate2(self) -> flate2::Compression {
        match self {
            Level::None => flate2::Compression::none(),
            Level::BestSpeed => flate2::Compression::fast(),
            Level::Default => flate2::Compression::default(),
            Level::BestCompression => flate2::Compression::best(),
            Level::Numeric(n) => flate2::Compression::new(n.min(9) as u32),
        }
    }
}

/// Deflate strategy. Accepted for API completeness (§6); see DESIGN.md for
/// why only `Default` currently affects the compressed output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Default,
    Filtered,
    HuffmanOnly,
    Rle,
    Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DeflateOptions {
    pub level: Level,
    pub strategy: Strategy,
}

/// Compression method for an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Store,
    Deflate(DeflateOptions),
}

impl Method {
    pub fn deflate_default() -> Self {
        Method::Deflate(DeflateOptions::default())
    }

    pub(crate) fn zip_code(&self) -> u16 {
        match self {
            Method::Store => 0,
            Method::Deflate(_) => 8,
        }
    }
}

/// A single logical file to place in the archive, described by where its
/// payload comes from and how it should be recorded.
#[derive(Clone)]
pub struct Entry {
    pub source: SourceDescriptor,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    pub attributes: Attributes,
    pub method: Method,
}

impl Entry {
    pub fn new(source: SourceDescriptor, path: impl Into<String>) -> Self {
        Entry {
            source,
            path: path.into(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            attributes: Attributes::default(),
            method: Method::Store,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    fn validate(&self) -> Result<(), EntryError> {
        self.source.validate()?;
        if self.path.is_empty() {
            return Err(EntryError::MissingPath);
        }
        self.attributes.validate()?;
        Ok(())
    }
}

/// An ordered, validated sequence of entries. Validity is the AND of every
/// entry's validity, recomputed on every `append`/`prepend`; an empty
/// manifest is always invalid (§3, §4.5).
#[derive(Clone, Default)]
pub struct Manifest {
    entries: Vec<Entry>,
    valid: bool,
}

impl Manifest {
    pub fn create() -> Self {
        Manifest { entries: Vec::new(), valid: false }
    }

    pub fn append(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self.revalidate();
        self
    }

    pub fn prepend(mut self, entry: Entry) -> Self {
        self.entries.insert(0, entry);
        self.revalidate();
        self
    }

    fn revalidate(&mut self) {
        self.valid = !self.entries.is_empty() && self.entries.iter().all(|e| e.validate().is_ok());
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The specific reason this manifest is invalid, or `None` if it's
    /// valid. Used to halt a stream started from an invalid manifest with
    /// the manifest's own failure reason as payload (§7).
    pub fn validation_error(&self) -> Option<ManifestError> {
        if self.entries.is_empty() {
            return Some(ManifestError::EmptyManifest);
        }
        self.entries
            .iter()
            .find_map(|e| e.validate().err())
            .map(ManifestError::Entry)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::SourceDescriptor;

    #[test]
    fn empty_manifest_is_invalid() {
        let m = Manifest::create();
        assert!(!m.is_valid());
        assert_eq!(m.validation_error(), Some(ManifestError::EmptyManifest));
    }

    #[test]
    fn single_valid_entry_is_valid() {
        let m = Manifest::create().append(Entry::new(SourceDescriptor::Random(8), "a.bin"));
        assert!(m.is_valid());
        assert!(m.validation_error().is_none());
    }

    #[test]
    fn missing_path_is_invalid() {
        let m = Manifest::create().append(Entry::new(SourceDescriptor::Random(8), ""));
        assert!(!m.is_valid());
    }

    #[test]
    fn empty_file_path_is_invalid() {
        let m = Manifest::create()
            .append(Entry::new(SourceDescriptor::File(std::path::PathBuf::new()), "a.bin"));
        assert!(!m.is_valid());
        assert_eq!(m.validation_error(), Some(ManifestError::Entry(EntryError::InvalidSource)));
    }

    #[test]
    fn mismatched_uid_gid_is_invalid() {
        let mut attrs = Attributes::default();
        attrs.uid = Some(1000);
        let entry = Entry::new(SourceDescriptor::Random(8), "a.bin").with_attributes(attrs);
        let m = Manifest::create().append(entry);
        assert!(!m.is_valid());
    }

    #[test]
    fn prepend_keeps_order() {
        let m = Manifest::create()
            .append(Entry::new(SourceDescriptor::Random(1), "second"))
            .prepend(Entry::new(SourceDescriptor::Random(1), "first"));
        assert_eq!(m.entries()[0].path, "first");
        assert_eq!(m.entries()[1].path, "second");
    }
}
