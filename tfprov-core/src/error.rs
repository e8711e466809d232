use std::fmt;

/// Main error type for fallible helpers used by the pipeline.
///
/// Nothing in here crosses a verb boundary: dispatchers and interceptors turn these
/// into diagnostics on the response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Per-call context could not be derived from the request
    #[error("{summary}: {message}")]
    Bootstrap {
        summary: String,
        message: String,
    },

    /// The in-context region lives outside the configured partition
    #[error("partition ({region_partition}) for per-resource Region ({region}) is not the provider's configured partition ({partition})")]
    PartitionMismatch {
        region: String,
        region_partition: String,
        partition: String,
    },

    /// A legacy import ID could not be understood
    #[error("invalid import ID \"{id}\": {message}")]
    InvalidImportId {
        id: String,
        message: String,
    },

    /// An ARN could not be parsed
    #[error("invalid ARN \"{arn}\": {message}")]
    InvalidArn {
        arn: String,
        message: String,
    },

    /// A backing service call failed
    #[error("{service}: {message}")]
    Service {
        service: String,
        message: String,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Result type alias for provider helpers
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Create a bootstrap error
    pub fn bootstrap(summary: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bootstrap {
            summary: summary.into(),
            message: message.into(),
        }
    }

    /// Create a partition mismatch error
    pub fn partition_mismatch(
        region: impl Into<String>,
        region_partition: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self::PartitionMismatch {
            region: region.into(),
            region_partition: region_partition.into(),
            partition: partition.into(),
        }
    }

    /// Create an import ID error
    pub fn invalid_import_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidImportId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an ARN parsing error
    pub fn invalid_arn(arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArn {
            arn: arn.into(),
            message: message.into(),
        }
    }

    /// Create a service error
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Diagnostic summary used when the error is surfaced on a response
    pub fn summary(&self) -> &str {
        match self {
            Self::Bootstrap { summary, .. } => summary,
            Self::PartitionMismatch { .. } => "Invalid Region Value",
            Self::InvalidImportId { .. } => "Invalid Import ID",
            Self::InvalidArn { .. } => "Invalid ARN",
            Self::Service { .. } => "Service Error",
            Self::Configuration(_) => "Invalid Provider Configuration",
        }
    }
}

/// Problems found while registering resources. Any of these prevents the provider from starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("duplicate {kind}: {type_name}")]
    Duplicate {
        kind: &'static str,
        type_name: String,
    },

    #[error("resource type {0}: uses WrappedImport but defines an import function")]
    WrappedImportDefinesImport(String),

    #[error("resource type {0}: uses CustomImport but does not define an import function")]
    CustomImportWithoutImport(String),

    #[error("resource type {0}: uses WrappedImport with multiple identity parameters but has no import ID parser")]
    MissingImportIdParser(String),

    #[error("`region` attribute is defined: {type_name} {kind}")]
    RegionAttributeDefined {
        kind: &'static str,
        type_name: String,
    },

    #[error("no `{attribute}` attribute defined in schema: {type_name} {kind}")]
    MissingAttribute {
        attribute: &'static str,
        kind: &'static str,
        type_name: String,
    },

    #[error("`{attribute}` attribute cannot be Computed: {type_name} {kind}")]
    AttributeComputed {
        attribute: &'static str,
        kind: &'static str,
        type_name: String,
    },

    #[error("`{attribute}` attribute must be Computed: {type_name} {kind}")]
    AttributeNotComputed {
        attribute: &'static str,
        kind: &'static str,
        type_name: String,
    },

    #[error("inherent region is not supported for global resources: {0} resource")]
    InherentRegionOnGlobal(String),
}

/// Multiple configuration errors collected during registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationErrors {
    pub errors: Vec<ConfigurationError>,
}

impl ConfigurationErrors {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
        }
    }

    pub fn add(&mut self, error: ConfigurationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ConfigurationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.errors.iter()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// One error per line, like a joined error list.
impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        Self::bootstrap("Invalid Provider Configuration", error.to_string())
    }
}

// Macro for creating service errors
#[macro_export]
macro_rules! provider_error {
    ($service:expr, $msg:expr) => {
        Err($crate::error::ProviderError::service($service, $msg))
    };
    ($service:expr, $fmt:expr, $($arg:tt)*) => {
        Err($crate::error::ProviderError::service($service, format!($fmt, $($arg)*)))
    };
}
