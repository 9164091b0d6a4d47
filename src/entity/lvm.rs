use serde::{Deserialize, Serialize};

use crate::errors::AlbiusError;

/// A row of the `pvs` report. Sizes are in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalVolume {
    pub path: String,

    // None means the PV is not assigned to any VG
    pub vg: Option<String>,

    pub format: String,
    pub attr: String,
    pub size: f64,
    pub free: f64,
}

/// A volume group folded from the per-PV rows of the `vgs` report.
/// Sizes are in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeGroup {
    pub name: String,

    // Member PV device paths, in report order
    pub pvs: Vec<String>,

    pub lv_count: u32,
    pub attr: String,
    pub size: f64,
    pub free: f64,
}

/// Anything with an identity LVM tools understand
pub trait Volume {
    fn identity(&self) -> &str;
}

impl Volume for PhysicalVolume {
    fn identity(&self) -> &str {
        &self.path
    }
}

/// A volume passed either as its raw identity string
/// (device path or VG name), or as a previously listed record.
#[derive(Debug, PartialEq)]
pub enum VolumeRef<'a, V> {
    Identity(&'a str),
    Record(&'a V),
}

// Manual impls: derive would require V: Copy
impl<V> Clone for VolumeRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for VolumeRef<'_, V> {}

pub type PvRef<'a> = VolumeRef<'a, PhysicalVolume>;

impl<'a, V: Volume> VolumeRef<'a, V> {
    /// Canonical identity string for this reference.
    ///
    /// The identity is not checked against the system: a missing volume
    /// is reported by the LVM tool itself. Only identities that cannot
    /// possibly name exactly one volume are rejected here.
    pub fn resolve(&self) -> Result<&'a str, AlbiusError> {
        let identity = self.raw();

        if identity.is_empty() {
            return Err(AlbiusError::AmbiguousReference(
                "empty volume identity".to_string(),
            ));
        }

        if identity
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(AlbiusError::AmbiguousReference(format!(
                "volume identity {identity:?} contains whitespace"
            )));
        }

        Ok(identity)
    }

    /// Identity as given, unchecked. Only for messages.
    pub fn raw(&self) -> &'a str {
        match *self {
            Self::Identity(s) => s,
            Self::Record(v) => v.identity(),
        }
    }
}

impl<'a, V> From<&'a str> for VolumeRef<'a, V> {
    fn from(s: &'a str) -> Self {
        Self::Identity(s)
    }
}

impl<'a, V> From<&'a String> for VolumeRef<'a, V> {
    fn from(s: &'a String) -> Self {
        Self::Identity(s.as_str())
    }
}

impl<'a> From<&'a PhysicalVolume> for PvRef<'a> {
    fn from(pv: &'a PhysicalVolume) -> Self {
        Self::Record(pv)
    }
}

/// Target size for pvresize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResizeTarget {
    /// Use all of the underlying device
    Maximum,

    /// Exact size in GiB, which may shrink the PV
    Exact(f64),
}

impl From<Option<f64>> for ResizeTarget {
    fn from(size: Option<f64>) -> Self {
        match size {
            None => Self::Maximum,
            Some(gib) => Self::Exact(gib),
        }
    }
}
