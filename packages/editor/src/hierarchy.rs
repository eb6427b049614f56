//! Structured hierarchy keys.
//!
//! Addresses live in source files as strings (`<component>:<seg>_<seg>`)
//! and travel over the wire as hierarchy ids (`<address>#<occurrence>`).
//! Everything past the boundary works on the parsed forms below.

use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyAddress {
    /// Address of the component that owns the element
    pub component: String,
    /// Structural index at each nesting depth
    pub segments: Vec<usize>,
}

impl HierarchyAddress {
    pub fn new(component: impl Into<String>, segments: Vec<usize>) -> Self {
        Self {
            component: component.into(),
            segments,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (component, path) = raw.trim().split_once(':')?;
        if component.is_empty() || path.is_empty() {
            return None;
        }
        let segments = path
            .split('_')
            .map(|segment| segment.parse::<usize>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(component, segments))
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for HierarchyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.component)?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "_")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// An address plus the occurrence index computed during one traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HierarchyId {
    pub address: HierarchyAddress,
    pub occurrence: usize,
}

impl HierarchyId {
    pub fn new(address: HierarchyAddress, occurrence: usize) -> Self {
        Self {
            address,
            occurrence,
        }
    }
}

impl fmt::Display for HierarchyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.occurrence)
    }
}

impl FromStr for HierarchyId {
    type Err = EditorError;

    /// `addr#occ`; a bare address means occurrence 0
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (address, occurrence) = match raw.rsplit_once('#') {
            Some((address, occurrence)) => {
                let occurrence = occurrence.parse::<usize>().map_err(|_| {
                    EditorError::invalid(format!("bad occurrence in hierarchy id {:?}", raw))
                })?;
                (address, occurrence)
            }
            None => (raw, 0),
        };
        let address = HierarchyAddress::parse(address)
            .ok_or_else(|| EditorError::invalid(format!("malformed hierarchy id {:?}", raw)))?;
        Ok(Self::new(address, occurrence))
    }
}

impl TryFrom<String> for HierarchyId {
    type Error = EditorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<HierarchyId> for String {
    fn from(id: HierarchyId) -> Self {
        id.to_string()
    }
}

/// Where an inserted or moved element lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyPosition {
    Before,
    After,
    Children,
    Parent,
}

impl fmt::Display for HierarchyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            HierarchyPosition::Before => "before",
            HierarchyPosition::After => "after",
            HierarchyPosition::Children => "into",
            HierarchyPosition::Parent => "around",
        };
        f.write_str(word)
    }
}

/// Render a path the way it is shown in history descriptions
pub fn describe_path(ids: &[HierarchyId]) -> String {
    ids.last()
        .map(ToString::to_string)
        .unwrap_or_else(|| "root".to_string())
}
