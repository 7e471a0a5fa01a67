//! Classifies reads objects and pulls their handles and metadata out of the
//! payload shape that matches their type.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::blobstore::Handle;
use crate::domain::{LibraryEnds, LibraryModule, LibraryType, TriState};
use crate::error::ReadsError;
use crate::workspace::WorkspaceObject;

/// One reads file: the blob handle and the type the object declares for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadsFile {
    pub handle: Handle,
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileLib {
    pub file: Handle,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
}

impl From<FileLib> for ReadsFile {
    fn from(lib: FileLib) -> Self {
        Self {
            handle: lib.file,
            declared_type: lib.file_type,
        }
    }
}

impl From<Handle> for ReadsFile {
    fn from(handle: Handle) -> Self {
        Self {
            handle,
            declared_type: None,
        }
    }
}

/// Optional biological metadata shared by all payload shapes. Values are
/// passed through untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataFields {
    #[serde(default)]
    pub single_genome: Option<Value>,
    #[serde(default)]
    pub read_orientation_outward: Option<Value>,
    #[serde(default)]
    pub insert_size_mean: Option<Value>,
    #[serde(default)]
    pub insert_size_std_dev: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub strain: Option<Value>,
    #[serde(default)]
    pub sequencing_tech: Option<Value>,
    #[serde(default)]
    pub read_count: Option<Value>,
    #[serde(default)]
    pub read_size: Option<Value>,
    #[serde(default)]
    pub gc_content: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilePaired {
    pub lib1: FileLib,
    #[serde(default)]
    pub lib2: Option<FileLib>,
    #[serde(flatten)]
    pub metadata: MetadataFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSingle {
    pub lib: FileLib,
    #[serde(flatten)]
    pub metadata: MetadataFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyPaired {
    pub handle_1: Handle,
    #[serde(default)]
    pub handle_2: Option<Handle>,
    #[serde(flatten)]
    pub metadata: MetadataFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblySingle {
    pub handle: Handle,
    #[serde(flatten)]
    pub metadata: MetadataFields,
}

/// Payload of a reads object, one variant per supported `module.type`.
#[derive(Debug, Clone)]
pub enum LibraryPayload {
    FilePaired(FilePaired),
    FileSingle(FileSingle),
    AssemblyPaired(AssemblyPaired),
    AssemblySingle(AssemblySingle),
}

/// How the reads of a library are laid out in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadsLayout {
    Single(ReadsFile),
    Split { forward: ReadsFile, reverse: ReadsFile },
    Interleaved(ReadsFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryMetadata {
    pub single_genome: TriState,
    pub read_orientation_outward: TriState,
    pub insert_size_mean: Option<Value>,
    pub insert_size_std_dev: Option<Value>,
    pub source: Option<Value>,
    pub strain: Option<Value>,
    pub sequencing_tech: Option<Value>,
    pub read_count: Option<Value>,
    pub read_size: Option<Value>,
    pub gc_content: Option<Value>,
}

/// A classified reads object, ready for download.
#[derive(Debug, Clone)]
pub struct ReadsLibrary {
    pub reference: String,
    pub name: String,
    pub kind: LibraryType,
    pub layout: ReadsLayout,
    pub metadata: LibraryMetadata,
}

pub fn classify(type_string: &str) -> Result<LibraryType, ReadsError> {
    type_string.parse()
}

impl LibraryPayload {
    pub fn parse(kind: LibraryType, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match (kind.module, kind.ends) {
            (LibraryModule::KBaseFile, LibraryEnds::Paired) => Self::FilePaired(from_data(data)?),
            (LibraryModule::KBaseFile, LibraryEnds::Single) => Self::FileSingle(from_data(data)?),
            (LibraryModule::KBaseAssembly, LibraryEnds::Paired) => {
                Self::AssemblyPaired(from_data(data)?)
            }
            (LibraryModule::KBaseAssembly, LibraryEnds::Single) => {
                Self::AssemblySingle(from_data(data)?)
            }
        })
    }

    pub fn layout(&self) -> ReadsLayout {
        match self {
            Self::FilePaired(payload) => match &payload.lib2 {
                Some(lib2) => ReadsLayout::Split {
                    forward: payload.lib1.clone().into(),
                    reverse: lib2.clone().into(),
                },
                None => ReadsLayout::Interleaved(payload.lib1.clone().into()),
            },
            Self::FileSingle(payload) => ReadsLayout::Single(payload.lib.clone().into()),
            Self::AssemblyPaired(payload) => match &payload.handle_2 {
                Some(handle_2) => ReadsLayout::Split {
                    forward: payload.handle_1.clone().into(),
                    reverse: handle_2.clone().into(),
                },
                None => ReadsLayout::Interleaved(payload.handle_1.clone().into()),
            },
            Self::AssemblySingle(payload) => ReadsLayout::Single(payload.handle.clone().into()),
        }
    }

    fn fields(&self) -> &MetadataFields {
        match self {
            Self::FilePaired(payload) => &payload.metadata,
            Self::FileSingle(payload) => &payload.metadata,
            Self::AssemblyPaired(payload) => &payload.metadata,
            Self::AssemblySingle(payload) => &payload.metadata,
        }
    }

    /// Applies the per-schema defaults for the genome and orientation flags.
    pub fn metadata(&self) -> LibraryMetadata {
        let fields = self.fields();
        let single_genome = match self {
            Self::FilePaired(_) | Self::FileSingle(_) => match &fields.single_genome {
                None | Some(Value::Null) => TriState::True,
                Some(value) => truthy(value).into(),
            },
            Self::AssemblyPaired(_) | Self::AssemblySingle(_) => TriState::Unset,
        };
        let read_orientation_outward = match (self, &fields.read_orientation_outward) {
            (Self::FileSingle(_) | Self::AssemblySingle(_), _) => TriState::Unset,
            (_, Some(value)) if !value.is_null() => truthy(value).into(),
            (Self::FilePaired(_), _) => TriState::False,
            (Self::AssemblyPaired(_), _) => TriState::Unset,
        };

        LibraryMetadata {
            single_genome,
            read_orientation_outward,
            insert_size_mean: fields.insert_size_mean.clone(),
            insert_size_std_dev: fields.insert_size_std_dev.clone(),
            source: fields.source.clone(),
            strain: fields.strain.clone(),
            sequencing_tech: fields.sequencing_tech.clone(),
            read_count: fields.read_count.clone(),
            read_size: fields.read_size.clone(),
            gc_content: fields.gc_content.clone(),
        }
    }
}

impl ReadsLibrary {
    pub fn from_object(object: WorkspaceObject) -> Result<Self, ReadsError> {
        let reference = object.info.reference.to_string();
        let name = object.info.name;
        let kind = classify(&object.info.type_string)?;
        let payload =
            LibraryPayload::parse(kind, object.data).map_err(|err| ReadsError::MalformedObject {
                reference: reference.clone(),
                name: name.clone(),
                message: format!("{kind} payload: {err}"),
            })?;

        Ok(Self {
            reference,
            name,
            kind,
            layout: payload.layout(),
            metadata: payload.metadata(),
        })
    }
}

fn from_data<T: DeserializeOwned>(data: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty() && text != "false" && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn handle(id: &str) -> Value {
        json!({"id": id, "url": "https://shock.example", "type": "shock"})
    }

    fn parse(type_string: &str, data: Value) -> LibraryPayload {
        LibraryPayload::parse(classify(type_string).unwrap(), data).unwrap()
    }

    #[test]
    fn file_paired_split_uses_each_libs_type() {
        let payload = parse(
            "KBaseFile.PairedEndLibrary-2.1",
            json!({
                "lib1": {"file": handle("f"), "type": "fastq"},
                "lib2": {"file": handle("r"), "type": "fq.gz"},
                "sequencing_tech": "fake data"
            }),
        );
        let ReadsLayout::Split { forward, reverse } = payload.layout() else {
            panic!("expected split layout");
        };
        assert_eq!(forward.handle.id, "f");
        assert_eq!(forward.declared_type.as_deref(), Some("fastq"));
        assert_eq!(reverse.handle.id, "r");
        assert_eq!(reverse.declared_type.as_deref(), Some("fq.gz"));

        let metadata = payload.metadata();
        assert_eq!(metadata.single_genome, TriState::True);
        assert_eq!(metadata.read_orientation_outward, TriState::False);
        assert_eq!(metadata.sequencing_tech, Some(json!("fake data")));
    }

    #[test]
    fn file_paired_without_lib2_is_interleaved() {
        let payload = parse(
            "KBaseFile.PairedEndLibrary-2.1",
            json!({"lib1": {"file": handle("i"), "type": ""}, "single_genome": 0}),
        );
        assert_matches!(payload.layout(), ReadsLayout::Interleaved(file) if file.handle.id == "i");
        assert_eq!(payload.metadata().single_genome, TriState::False);
    }

    #[test]
    fn orientation_flag_is_coerced() {
        let payload = parse(
            "KBaseFile.PairedEndLibrary-2.1",
            json!({"lib1": {"file": handle("i")}, "read_orientation_outward": 1}),
        );
        assert_eq!(payload.metadata().read_orientation_outward, TriState::True);

        let payload = parse(
            "KBaseAssembly.PairedEndLibrary-1.0",
            json!({"handle_1": handle("i"), "read_orientation_outward": 0}),
        );
        assert_eq!(payload.metadata().read_orientation_outward, TriState::False);
    }

    #[test]
    fn assembly_defaults_are_unknown() {
        let payload = parse(
            "KBaseAssembly.PairedEndLibrary-1.0",
            json!({"handle_1": handle("f"), "handle_2": handle("r"), "insert_size_mean": 300.5}),
        );
        assert_matches!(payload.layout(), ReadsLayout::Split { .. });
        let metadata = payload.metadata();
        assert_eq!(metadata.single_genome, TriState::Unset);
        assert_eq!(metadata.read_orientation_outward, TriState::Unset);
        assert_eq!(metadata.insert_size_mean, Some(json!(300.5)));
    }

    #[test]
    fn single_end_has_no_orientation() {
        let payload = parse(
            "KBaseFile.SingleEndLibrary-2.2",
            json!({"lib": {"file": handle("s"), "type": "fq"}, "read_orientation_outward": 1}),
        );
        assert_matches!(payload.layout(), ReadsLayout::Single(_));
        assert_eq!(payload.metadata().read_orientation_outward, TriState::Unset);
        assert_eq!(payload.metadata().single_genome, TriState::True);

        let payload = parse("KBaseAssembly.SingleEndLibrary", json!({"handle": handle("s")}));
        assert_eq!(payload.metadata().single_genome, TriState::Unset);
    }

    #[test]
    fn scalar_metadata_is_copied_verbatim() {
        let payload = parse(
            "KBaseFile.PairedEndLibrary-2.1",
            json!({
                "lib1": {"file": handle("i")},
                "read_count": 1000.0,
                "read_size": "150",
                "gc_content": null,
                "sequencing_tech": 7
            }),
        );
        let metadata = payload.metadata();
        assert_eq!(metadata.read_count, Some(json!(1000.0)));
        assert_eq!(metadata.read_size, Some(json!("150")));
        assert_eq!(metadata.gc_content, None);
        assert_eq!(metadata.sequencing_tech, Some(json!(7)));
    }

    #[test]
    fn payload_shape_must_match_type() {
        let kind = classify("KBaseFile.PairedEndLibrary").unwrap();
        assert!(LibraryPayload::parse(kind, json!({"handle_1": handle("x")})).is_err());
    }
}
