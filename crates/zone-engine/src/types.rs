use crate::persistence::ReconcileFailure;
use crate::store::StoreError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Unsupported unit: {0:?}")]
    UnsupportedUnitKind(String),
    #[error("Degenerate zone geometry: width {width}, height {height}")]
    DegenerateGeometry { width: f64, height: f64 },
    #[error("Persistence failure ({context}): {source}")]
    PersistenceFailure {
        context: String,
        #[source]
        source: StoreError,
    },
    #[error("Save may have missing zones: {} of {attempted} zone operations failed", .failures.len())]
    PartialReconciliationFailure {
        attempted: usize,
        failures: Vec<ReconcileFailure>,
    },
    #[error("Unparsable dimension string: {0:?}")]
    DimensionParse(String),
    #[error("Unknown zone type: {0:?}")]
    InvalidZoneType(String),
    #[error("Zone {zone} expects {expected} content")]
    ContentTypeMismatch { zone: String, expected: ZoneType },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Document has no pages")]
    NoPages,
    #[error("Operation cancelled: editing session was torn down")]
    Cancelled,
}

impl ZoneError {
    pub(crate) fn persistence(context: impl Into<String>, source: StoreError) -> Self {
        ZoneError::PersistenceFailure {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZoneError>;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(
    /// Identifies a row in `templates`
    TemplateId
);
id_type!(
    /// Identifies a row in `template_pages`
    PageId
);
id_type!(
    /// Identifies a row in `customization_zones`
    ZoneId
);
id_type!(
    /// Identifies a row in `zone_page_assignments`
    AssignmentId
);

/// What a zone accepts from the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ZoneType {
    Image,
    Text,
}

impl ZoneType {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Image => "image",
            ZoneType::Text => "text",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(ZoneType::Image),
            "text" => Ok(ZoneType::Text),
            _ => Err(ZoneError::InvalidZoneType(s.to_string())),
        }
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height >= width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

impl Orientation {
    pub fn of(width: f64, height: f64) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}
