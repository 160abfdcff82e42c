use anyhow::{anyhow, Error, Result};
use std::fmt;

/// Controls whether an exportable configuration artifact may be imported by other namespaces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigScope {
    /// Visible mesh-wide, subject to the consuming namespace's imports.
    #[default]
    Public = 0,

    /// Visible only within the artifact's own namespace.
    Private = 1,
}

/// Indicates the imports to apply to a namespace that has no dependency declaration.
///
/// This is a single mesh-wide setting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportMode {
    SameNamespace,
    AllNamespaces,
}

// === impl ConfigScope ===

impl ConfigScope {
    #[inline]
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private)
    }
}

impl TryFrom<i32> for ConfigScope {
    type Error = Error;

    fn try_from(v: i32) -> Result<Self> {
        match v {
            0 => Ok(Self::Public),
            1 => Ok(Self::Private),
            v => Err(anyhow!("invalid config scope: {}", v)),
        }
    }
}

impl std::str::FromStr for ConfigScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("public") {
            return Ok(Self::Public);
        }
        if s.eq_ignore_ascii_case("private") {
            return Ok(Self::Private);
        }
        Err(anyhow!("invalid config scope: {:?}", s))
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => "PUBLIC".fmt(f),
            Self::Private => "PRIVATE".fmt(f),
        }
    }
}

// === impl ImportMode ===

impl std::str::FromStr for ImportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "same-namespace" | "SAME_NAMESPACE" => Ok(Self::SameNamespace),
            "all-namespaces" | "ALL_NAMESPACES" => Ok(Self::AllNamespaces),
            s => Err(anyhow!("invalid import mode: {:?}", s)),
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameNamespace => "same-namespace".fmt(f),
            Self::AllNamespaces => "all-namespaces".fmt(f),
        }
    }
}
