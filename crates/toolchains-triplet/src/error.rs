//! Error types for triplet parsing and validation.

/// Errors that can occur while parsing or validating platform triplets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripletError {
    /// The string does not have 2 to 4 hyphen-separated fields.
    #[error("illegal triplet \"{input}\": expected 2 to 4 fields, found {fields}")]
    Malformed {
        /// The rejected input.
        input: String,
        /// Number of fields found.
        fields: usize,
    },

    /// The triplet is well formed but not in the supported platform list.
    #[error("{role} \"{triplet}\" is not supported")]
    Unsupported {
        /// Which role the triplet was checked for ("host" or "target").
        role: &'static str,
        /// The offending triplet.
        triplet: String,
    },

    /// No known operating environment matches the triplet.
    #[error("cannot determine the operating environment of \"{triplet}\"")]
    UnknownEnvironment {
        /// The offending triplet.
        triplet: String,
    },
}

/// Result type for triplet operations.
pub type Result<T> = std::result::Result<T, TripletError>;
