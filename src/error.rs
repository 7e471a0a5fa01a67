use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ReadsError {
    #[error("workspace_name parameter is required")]
    MissingWorkspaceName,

    #[error("invalid workspace name: {0}")]
    InvalidWorkspaceName(String),

    #[error("invalid workspace object name: {0}")]
    InvalidObjectName(String),

    #[error("at least one reads library must be provided")]
    NoLibraries,

    #[error("illegal value for boolean parameter {param}: {value}")]
    InvalidTriState { param: String, value: String },

    #[error("unsupported object type {type_string}; only the types {supported} are supported")]
    UnsupportedType {
        type_string: String,
        supported: String,
    },

    #[error("reads object {reference} ({name}) is malformed: {message}")]
    MalformedObject {
        reference: String,
        name: String,
        message: String,
    },

    #[error(
        "a valid filename could not be determined for blob store node {node}. In order of precedence:\n\
         File type is: {}\n\
         Handle file name is: {}\n\
         Blob store file name is: {node_file_name}\n\
         Acceptable extensions: {accepted}",
        .file_type.as_deref().unwrap_or("None"),
        .handle_file_name.as_deref().unwrap_or("None")
    )]
    InvalidFileKind {
        node: String,
        file_type: Option<String>,
        handle_file_name: Option<String>,
        node_file_name: String,
        accepted: String,
    },

    #[error("blob store node id {0:?} is not usable as a file name")]
    UnsafeHandleId(String),

    #[error("auth token required (--token or KB_AUTH_TOKEN)")]
    MissingToken,

    #[error("blob store request failed: {0}")]
    BlobStoreHttp(String),

    #[error("blob store returned status {status}: {message}")]
    BlobStoreStatus { status: u16, message: String },

    #[error(
        "error downloading reads for object {reference} ({name}) from blob store node {node}: {source}"
    )]
    Download {
        reference: String,
        name: String,
        node: String,
        #[source]
        source: Box<ReadsError>,
    },

    #[error("workspace request failed: {0}")]
    WorkspaceHttp(String),

    #[error("workspace returned status {status}: {message}")]
    WorkspaceStatus { status: u16, message: String },

    #[error("workspace error {name}: {message}")]
    WorkspaceRpc { name: String, message: String },

    #[error("FASTQ mismatch: {0}")]
    FastqMismatch(String),

    #[error("file already appears to be gzipped: {0}")]
    AlreadyCompressed(String),

    #[error("file does not appear to be gzipped: {0}")]
    NotCompressed(String),

    #[error("missing config file reads-to-fastq.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl ReadsError {
    /// True for errors raised while checking a request, before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReadsError::MissingWorkspaceName
                | ReadsError::InvalidWorkspaceName(_)
                | ReadsError::InvalidObjectName(_)
                | ReadsError::NoLibraries
                | ReadsError::InvalidTriState { .. }
                | ReadsError::UnsupportedType { .. }
                | ReadsError::MalformedObject { .. }
                | ReadsError::UnsafeHandleId(_)
                | ReadsError::MissingToken
        )
    }
}
