use thiserror::Error;

/// Errors that can arise while running the game or touching its storage.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (catalog files, directory creation).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON that does not match the expected record shape.
    #[error("catalog parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// A debit larger than the current balance. Nothing was changed.
    #[error("insufficient funds: cost {cost}, balance {balance}")]
    InsufficientFunds { cost: u64, balance: u64 },

    /// Mission template that could never complete.
    #[error("mission template '{0}' requires zero ticks")]
    ZeroRequiredTicks(String),

    /// The same mission name appears twice in one catalog.
    #[error("mission template '{0}' is defined more than once")]
    DuplicateTemplate(String),

    /// Parent links that loop back on themselves or point nowhere.
    #[error("mission template '{0}' is not part of a well-formed tree")]
    TemplateCycle(String),

    /// A catalog with nothing in it.
    #[error("{0} catalog is empty")]
    EmptyCatalog(&'static str),

    /// Creating something that must be unique when it already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Rejected user-supplied name.
    #[error("invalid name: {0}")]
    InvalidName(String),
}
