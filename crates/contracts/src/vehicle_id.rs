//! Cheap-to-clone vehicle identifier backed by `Arc<str>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier a telemetry provider assigns to one vehicle.
///
/// Every tick hands out fresh copies of these ids: they key the cooldown
/// maps, the per-tick candidate sets and the plate registry, so clones
/// vastly outnumber constructions. Backing the id with `Arc<str>` keeps a
/// clone at one reference-count bump.
///
/// Equality, hashing and serde all treat the id as its string content, and
/// `Borrow<str>` lets maps keyed by `VehicleId` answer plain `&str` lookups.
///
/// # Examples
/// ```
/// use contracts::VehicleId;
///
/// let id = VehicleId::new("veh_42");
/// assert_eq!(id.as_str(), "veh_42");
/// assert_eq!(id.clone(), id);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VehicleId(Arc<str>);

impl VehicleId {
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VehicleId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VehicleId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Literal comparisons keep call sites and assertions readable.
impl PartialEq<str> for VehicleId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for VehicleId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for VehicleId {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other.as_str()
    }
}

// On the wire the id is a bare JSON string, not a wrapper object.
impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
