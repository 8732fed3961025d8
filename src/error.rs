use crate::types::generics::Primitive;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error(
        "no strategy accepts {member} of {target}; the method must be one of: {}",
        requirements.join(", ")
    )]
    Unresolved {
        target: String,
        member: String,
        requirements: Vec<String>,
    },

    #[error(
        "{member} of {target} is accepted by more than one strategy: {}",
        strategies.join(", ")
    )]
    Ambiguous {
        target: String,
        member: String,
        strategies: Vec<String>,
    },

    #[error("failed to realize {member} of {target}: {source}")]
    Realization {
        target: String,
        member: String,
        #[source]
        source: RealizationError,
    },

    #[error("failed to instantiate {implementation}: {reason}")]
    Instantiation {
        implementation: String,
        reason: String,
    },

    #[error("{0} is neither an interface nor an abstract class")]
    InvalidTarget(String),

    #[error("write guard passed for {0} does not belong to this cache")]
    ForeignLock(String),
}

impl GenerationError {
    pub fn member(&self) -> Option<&str> {
        match self {
            GenerationError::Unresolved { member, .. }
            | GenerationError::Ambiguous { member, .. }
            | GenerationError::Realization { member, .. } => Some(member),
            GenerationError::Instantiation { .. }
            | GenerationError::InvalidTarget(_)
            | GenerationError::ForeignLock(_) => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RealizationError {
    #[error("can't build unwrap accessor for non-primitive type {0}")]
    NonPrimitive(String),
    #[error("unsupported primitive type: {0}")]
    UnsupportedPrimitive(Primitive),
    #[error("no implementation of {method} found in {delegate}")]
    MissingDelegateMethod { delegate: String, method: String },
    #[error("marker {0} carries no value")]
    EmptyMarker(String),
    #[error("{0}")]
    Unsupported(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("type {0} is declared twice")]
    DuplicateType(String),
    #[error("type index {0} does not exist in this catalog")]
    InvalidIndex(u32),
    #[error("generic index {index} out of bounds for {owner} (length {length})")]
    GenericIndexOutOfBounds {
        owner: String,
        index: usize,
        length: usize,
    },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown type {name} referenced from {context}")]
    UnknownType { name: String, context: String },
    #[error("unknown type kind {0} (expected \"class\" or \"interface\")")]
    UnknownKind(String),
    #[error("{0} cannot take type arguments")]
    NotGeneric(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("type {0} is not declared in the manifest")]
    UnknownType(String),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize statistics: {0}")]
    Json(#[from] serde_json::Error),
}
