use std::path::PathBuf;
use thiserror::Error;

/// The main error type for litterprep operations.
#[derive(Debug, Error)]
pub enum LitterprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read annotation document {path}: {source}")]
    AnnotationsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation document {path}: {source}")]
    AnnotationsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Annotation document {path} contains no images")]
    EmptyImageList { path: PathBuf },

    #[error("{count} image file(s) referenced by the annotation document are missing from disk")]
    MissingImages {
        count: usize,
        /// First few unresolved paths, for the diagnostic.
        sample: Vec<String>,
    },

    #[error("Failed to parse class names from {path}: {source}")]
    ClassNamesParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Class names file {path} is invalid: {message}")]
    ClassNamesInvalid { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write bundle {path}: {source}")]
    BundleWrite {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed while traversing {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("No image/label pairs found under {path}")]
    NoPairsFound { path: PathBuf },

    #[error("Check failed with {finding_count} finding(s)")]
    CheckFailed { finding_count: usize },
}

impl LitterprepError {
    /// Process exit code for this error.
    ///
    /// The fatal conversion conditions keep distinct codes so shell
    /// pipelines can tell them apart: 2 for an unreadable/unparseable
    /// annotation document, 3 for an empty image list, 4 for images
    /// missing from disk. Everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            LitterprepError::AnnotationsRead { .. } | LitterprepError::AnnotationsParse { .. } => 2,
            LitterprepError::EmptyImageList { .. } => 3,
            LitterprepError::MissingImages { .. } => 4,
            _ => 1,
        }
    }
}
