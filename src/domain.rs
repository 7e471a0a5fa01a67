use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ReadsError;

static INVALID_WORKSPACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w:._-]").expect("valid regex"));
static INVALID_OBJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w|._-]").expect("valid regex"));

/// A boolean that may also be unknown or unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    True,
    False,
    #[default]
    Unset,
}

impl TriState {
    /// Parses an optional request literal; absence means [`TriState::Unset`].
    pub fn from_param(param: &str, value: Option<&str>) -> Result<Self, ReadsError> {
        match value {
            None => Ok(TriState::Unset),
            Some("true") => Ok(TriState::True),
            Some("false") => Ok(TriState::False),
            Some(other) => Err(ReadsError::InvalidTriState {
                param: param.to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriState::True => "true",
            TriState::False => "false",
            TriState::Unset => "unknown",
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkspaceName {
    type Err = ReadsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(ReadsError::MissingWorkspaceName);
        }
        if INVALID_WORKSPACE_NAME.is_match(value) {
            return Err(ReadsError::InvalidWorkspaceName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectName(String);

impl ObjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `workspace/object` form the object store resolves.
    pub fn reference_in(&self, workspace: &WorkspaceName) -> String {
        format!("{}/{}", workspace.as_str(), self.0)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectName {
    type Err = ReadsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() || INVALID_OBJECT_NAME.is_match(value) {
            return Err(ReadsError::InvalidObjectName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

/// Resolved `workspace_id/object_id/version` reference of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub workspace_id: u64,
    pub object_id: u64,
    pub version: u64,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.workspace_id, self.object_id, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryModule {
    KBaseFile,
    KBaseAssembly,
}

impl LibraryModule {
    pub const ALL: [LibraryModule; 2] = [LibraryModule::KBaseFile, LibraryModule::KBaseAssembly];

    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryModule::KBaseFile => "KBaseFile",
            LibraryModule::KBaseAssembly => "KBaseAssembly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryEnds {
    Single,
    Paired,
}

impl LibraryEnds {
    pub const ALL: [LibraryEnds; 2] = [LibraryEnds::Paired, LibraryEnds::Single];

    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryEnds::Single => "SingleEndLibrary",
            LibraryEnds::Paired => "PairedEndLibrary",
        }
    }
}

/// The `module.type` tag of a reads object, parsed once from its type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryType {
    pub module: LibraryModule,
    pub ends: LibraryEnds,
}

impl LibraryType {
    pub fn supported() -> Vec<LibraryType> {
        LibraryModule::ALL
            .iter()
            .flat_map(|module| {
                LibraryEnds::ALL.iter().map(|ends| LibraryType {
                    module: *module,
                    ends: *ends,
                })
            })
            .collect()
    }

    pub fn supported_list() -> String {
        Self::supported()
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module.as_str(), self.ends.as_str())
    }
}

impl FromStr for LibraryType {
    type Err = ReadsError;

    /// Accepts `<module>.<type>-<semver>`; the version suffix is optional.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unsupported = || ReadsError::UnsupportedType {
            type_string: value.to_string(),
            supported: Self::supported_list(),
        };
        let unversioned = value.split('-').next().unwrap_or_default();
        let (module, ends) = unversioned.split_once('.').ok_or_else(unsupported)?;
        let module = LibraryModule::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == module)
            .ok_or_else(unsupported)?;
        let ends = LibraryEnds::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == ends)
            .ok_or_else(unsupported)?;
        Ok(Self { module, ends })
    }
}
