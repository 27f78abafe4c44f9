use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Custom error types for source access.
///
/// Every fallible operation in the crate reports one of these four
/// conditions. The variants carry a human-readable description of what was
/// requested and why it was rejected.
#[derive(Debug)]
pub enum SourceError {
    /// A malformed argument was passed (empty name, unknown unit id,
    /// mismatched constructor inputs)
    InvalidArgument(String),
    /// A referenced epoch, unit, or property does not exist
    NotFound(String),
    /// A frame range or channel selection falls outside the valid domain
    InvalidRange(String),
    /// The operation has no implementation for this source
    Unsupported(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            SourceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            SourceError::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
            SourceError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl Error for SourceError {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Whether a channel carries signal or serves as a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// A recording site producing a voltage trace
    Recording,
    /// A reference electrode
    Reference,
}

/// Metadata describing a single recording channel.
///
/// Format adapters that know their probe geometry populate this; sources
/// without the information report `Unsupported` from `channel_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    /// Group the channel belongs to (e.g. tetrode number)
    pub group: i64,
    /// Spatial position of the recording site, two or three dimensional
    pub position: Vec<f64>,
    /// Recording or reference channel
    pub kind: ChannelKind,
}

/// A named, half-open frame interval `[start_frame, end_frame)` marking a
/// segment of interest in a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    /// First frame of the epoch (inclusive)
    pub start_frame: usize,
    /// One past the last frame of the epoch (exclusive)
    pub end_frame: usize,
}

/// Ordered store of named epochs owned by a recording source.
///
/// Insertion order is retained so that `epoch_names` can break start-frame
/// ties in favor of the epoch added first.
#[derive(Debug, Clone, Default)]
pub struct EpochStore {
    entries: Vec<(String, Epoch)>,
}

impl EpochStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        EpochStore { entries: Vec::new() }
    }

    /// Inserts an epoch, replacing any existing epoch of the same name
    /// in place.
    pub fn insert(&mut self, name: &str, epoch: Epoch) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = epoch,
            None => self.entries.push((name.to_string(), epoch)),
        }
    }

    /// Removes the named epoch, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Epoch> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Looks up an epoch by name.
    pub fn get(&self, name: &str) -> Option<Epoch> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| *e)
    }

    /// Epoch names sorted by ascending start frame, insertion order for ties.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<(usize, &str)> = self
            .entries
            .iter()
            .map(|(n, e)| (e.start_frame, n.as_str()))
            .collect();
        names.sort_by_key(|(start, _)| *start);
        names.into_iter().map(|(_, n)| n.to_string()).collect()
    }

    /// Number of stored epochs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no epochs are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single property payload attached to a unit.
///
/// Properties are user-defined per-unit annotations (quality scores,
/// labels, feature vectors), so the value space is a small tagged union
/// rather than one fixed numeric type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Text label
    Str(String),
    /// Boolean flag
    Bool(bool),
    /// Integer vector
    IntArray(Vec<i64>),
    /// Floating point vector (e.g. PCA features)
    FloatArray(Vec<f64>),
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// Per-unit named property storage owned by a sorting source.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    by_unit: HashMap<usize, HashMap<String, PropertyValue>>,
}

impl PropertyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        PropertyStore {
            by_unit: HashMap::new(),
        }
    }

    /// Sets a property for a unit, overwriting any previous value.
    pub fn set(&mut self, unit_id: usize, name: &str, value: PropertyValue) {
        self.by_unit
            .entry(unit_id)
            .or_default()
            .insert(name.to_string(), value);
    }

    /// True when at least one property has been recorded for the unit.
    pub fn has_unit(&self, unit_id: usize) -> bool {
        self.by_unit.contains_key(&unit_id)
    }

    /// Looks up a property value for a unit.
    pub fn get(&self, unit_id: usize, name: &str) -> Option<&PropertyValue> {
        self.by_unit.get(&unit_id).and_then(|props| props.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_store_overwrites_in_place() {
        let mut store = EpochStore::new();
        store.insert(
            "stim",
            Epoch {
                start_frame: 0,
                end_frame: 10,
            },
        );
        store.insert(
            "rest",
            Epoch {
                start_frame: 10,
                end_frame: 20,
            },
        );
        store.insert(
            "stim",
            Epoch {
                start_frame: 5,
                end_frame: 15,
            },
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("stim").unwrap().start_frame, 5);
    }

    #[test]
    fn sorted_names_breaks_ties_by_insertion() {
        let mut store = EpochStore::new();
        let epoch = Epoch {
            start_frame: 3,
            end_frame: 9,
        };
        store.insert("zebra", epoch);
        store.insert("alpha", epoch);
        store.insert(
            "early",
            Epoch {
                start_frame: 0,
                end_frame: 2,
            },
        );
        assert_eq!(store.sorted_names(), vec!["early", "zebra", "alpha"]);
    }

    #[test]
    fn property_store_roundtrip() {
        let mut store = PropertyStore::new();
        store.set(4, "quality", PropertyValue::Float(0.9));
        assert_eq!(store.get(4, "quality"), Some(&PropertyValue::Float(0.9)));
        assert_eq!(store.get(4, "missing"), None);
        assert!(!store.has_unit(7));
    }
}
