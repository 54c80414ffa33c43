//! In-memory configuration document
//!
//! A [`ConfigDocument`] holds the parsed JSON tree of the agent configuration
//! together with the exact bytes it was parsed from. Edits never mutate a
//! document in place: [`ConfigDocument::with_value`] returns a new document,
//! leaving the original snapshot available to every check of a scan.
//!
//! An unedited document serializes back to its original bytes, so a run that
//! applies nothing can never reformat the operator's file.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Dotted location inside the configuration tree (e.g. `gateway.auth.mode`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// Build a path from individual keys
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path. Empty segments are ignored.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    /// Return a new path with one more key appended
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last key of the path, if any
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for ConfigPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl Serialize for ConfigPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parsed configuration file plus its provenance
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Value,
    raw_bytes: Vec<u8>,
    edited: bool,
}

impl ConfigDocument {
    /// Load and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let unreadable = |source: std::io::Error| Error::Unreadable {
            path: path.display().to_string(),
            source,
        };

        // Backups, writes and permission changes all target the real file,
        // so a symlinked config keeps its link.
        let resolved = std::fs::canonicalize(path).map_err(unreadable)?;
        let bytes = std::fs::read(&resolved).map_err(unreadable)?;

        Self::from_bytes(resolved, bytes)
    }

    /// Parse configuration bytes that were read from `path`
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let root: Value =
            serde_json::from_slice(&bytes).map_err(|source| Error::MalformedJson {
                path: path.display().to_string(),
                source,
            })?;

        if !root.is_object() {
            return Err(Error::NotAnObject {
                path: path.display().to_string(),
            });
        }

        Ok(Self {
            path,
            root,
            raw_bytes: bytes,
            edited: false,
        })
    }

    /// Filesystem location the document was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Bytes the document was originally parsed from
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Whether any edit changed the tree since load
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Look up a value by path
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, key| node.as_object()?.get(key))
    }

    /// Look up a string value by path
    pub fn get_str(&self, path: &ConfigPath) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Look up an object by path
    pub fn get_object(&self, path: &ConfigPath) -> Option<&Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }

    /// Return a copy of this document with `value` stored at `path`
    ///
    /// Missing intermediate objects are created. Setting a value equal to the
    /// current one returns an unchanged copy, so repeated edits converge.
    pub fn with_value(&self, path: &ConfigPath, value: Value) -> Result<Self> {
        if path.is_root() {
            return Err(Error::InvalidEdit {
                path: path.to_string(),
                message: "cannot replace the document root".into(),
            });
        }

        if self.get(path) == Some(&value) {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        let (leaf, parents) = path
            .segments()
            .split_last()
            .ok_or_else(|| Error::Internal("empty path after root check".into()))?;

        let mut node = &mut next.root;
        for key in parents {
            let map = node.as_object_mut().ok_or_else(|| Error::InvalidEdit {
                path: path.to_string(),
                message: format!("'{}' is not an object", key),
            })?;
            node = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let map = node.as_object_mut().ok_or_else(|| Error::InvalidEdit {
            path: path.to_string(),
            message: "parent is not an object".into(),
        })?;
        map.insert(leaf.clone(), value);
        next.edited = true;

        Ok(next)
    }

    /// Serialize the document for writing back to disk
    ///
    /// Unedited documents return their original bytes. Edited documents are
    /// pretty-printed with the original indentation and trailing newline.
    /// Key order survives, but scalar spelling is normalized: `1e3` becomes
    /// `1000.0` and escapes such as `\u00e9` are written as UTF-8.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.edited {
            return Ok(self.raw_bytes.clone());
        }

        let indent = detect_indent(&self.raw_bytes);
        let mut out = Vec::with_capacity(self.raw_bytes.len() + 64);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.root.serialize(&mut serializer)?;

        if self.raw_bytes.ends_with(b"\n") {
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// Indentation of the first indented line, defaulting to two spaces
fn detect_indent(raw: &[u8]) -> Vec<u8> {
    raw.split(|b| *b == b'\n')
        .skip(1)
        .map(|line| {
            line.iter()
                .take_while(|b| **b == b' ' || **b == b'\t')
                .copied()
                .collect::<Vec<u8>>()
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or_else(|| b"  ".to_vec())
}
