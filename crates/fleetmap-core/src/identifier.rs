//! Node keys backed by a global string interner.
//!
//! Discovery data refers to nodes by string ids, hardware addresses and other
//! alternate keys. The engine compares and hashes those keys constantly while
//! building a topology, so they are interned once into a copyable [`Id`].

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for node keys.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Interned key for a node, a hardware address or any other alternate key.
///
/// # Examples
///
/// ```
/// use fleetmap_core::identifier::Id;
///
/// let node = Id::new("5f2a9c");
/// let mac = Id::new("08:00:27:aa:bb:cc");
///
/// assert_ne!(node, mac);
/// assert_eq!(node, "5f2a9c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a string slice, interning it on first use.
    pub fn new(key: &str) -> Self {
        Self(interner().get_or_intern(key))
    }

    /// Returns an owned copy of the interned string.
    pub fn to_key_string(self) -> String {
        self.to_string()
    }

    /// Returns an `Id` formed by prepending `prefix` to this key.
    ///
    /// ```
    /// use fleetmap_core::identifier::Id;
    ///
    /// let socket = Id::new("node-7").with_prefix("socket-");
    /// assert_eq!(socket, "socket-node-7");
    /// ```
    pub fn with_prefix(self, prefix: &str) -> Self {
        let mut interner = interner();
        let joined = match interner.resolve(self.0) {
            Some(key) => format!("{prefix}{key}"),
            None => prefix.to_string(),
        };
        Self(interner.get_or_intern(joined))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let key = interner.resolve(self.0).unwrap_or_default();
        f.write_str(key)
    }
}

impl From<&str> for Id {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Id {
    fn from(key: String) -> Self {
        Self::new(&key)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "key"`
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Self::new(&key))
    }
}
