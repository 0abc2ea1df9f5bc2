//! Error types for account resolution

use thiserror::Error;

/// Account resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Dependency errors
    /// A seed referenced an account or argument that is not known yet
    ///
    /// **Triggered by:** `AccountRef`/`ArgumentRef` seeds whose target has no value,
    /// or an account with no default rule that the caller did not supply
    /// **Recovery:** Supply the value, or let a later resolution pass produce it
    #[error("Missing dependency: {name}")]
    MissingDependency {
        /// Account or argument name that is missing
        name: String,
    },

    /// Two or more derived accounts block on each other
    ///
    /// **Triggered by:** A derives from B while B derives from A (directly or transitively)
    /// **Recovery:** None - the instruction description itself is unresolvable
    #[error("Cyclic dependency between accounts: {}", .names.join(" -> "))]
    CyclicDependency {
        /// Accounts on the cycle, in dependency order
        names: Vec<String>,
    },

    /// Derivation stopped at the configured pass limit before this account settled
    #[error("Pass limit reached after {passes} passes")]
    PassLimitReached {
        /// Passes performed
        passes: usize,
    },

    // Seed errors
    /// A literal seed's stored data does not decode under its declared encoding
    #[error("Invalid seed encoding: {description}")]
    InvalidSeedEncoding {
        /// Which seed failed and why
        description: String,
    },

    /// Seed kind the engine cannot evaluate (e.g. a field read out of account data)
    #[error("Unsupported seed: {description}")]
    UnsupportedSeed {
        /// Description of the seed
        description: String,
    },

    /// A single seed exceeds the platform's per-seed length limit
    #[error("Seed {index} is {len} bytes long (max {max})")]
    MaxSeedLengthExceeded {
        /// Position of the seed
        index: usize,
        /// Actual seed length
        len: usize,
        /// Maximum allowed seed length
        max: usize,
    },

    /// More seeds than the platform accepts
    #[error("Too many seeds: {count} (max {max})")]
    TooManySeeds {
        /// Number of seeds supplied (including bump, when present)
        count: usize,
        /// Maximum number of seeds
        max: usize,
    },

    /// Seeds plus bump hash to a point on the ed25519 curve
    #[error("Provided seeds do not result in a valid program address")]
    InvalidSeeds,

    /// All 256 bump candidates produced on-curve points
    ///
    /// **Triggered by:** Practically never; indicates a platform-level anomaly
    #[error("No valid bump found for program {program}")]
    NoValidBumpFound {
        /// Owner program (base58)
        program: String,
    },

    // Argument errors
    /// A seed references an argument the instruction does not declare
    #[error("Unknown argument: {name}")]
    UnknownArgument {
        /// Argument name
        name: String,
    },

    /// Argument value does not fit its declared type
    ///
    /// **Triggered by:** `-1` for a `u8`, `300` for a `u8`, a string for a `publicKey`
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument {
        /// Argument name (or type description when parsed in isolation)
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // Input errors
    /// String is not a base58-encoded 32-byte address
    #[error("Invalid address: {value}")]
    InvalidAddress {
        /// Offending input
        value: String,
    },

    /// Two accounts share a name within one instruction
    #[error("Duplicate account name in instruction {instruction}: {name}")]
    DuplicateAccount {
        /// Instruction name
        instruction: String,
        /// Repeated account name
        name: String,
    },

    /// Program interface document could not be read
    #[error("IDL parse error: {0}")]
    IdlParse(String),

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal error that cannot be recovered from
    Fatal,
    /// Recoverable error that may be retried
    Recoverable,
    /// Warning that doesn't prevent execution
    Warning,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a missing dependency error for `name`
    pub fn missing(name: impl Into<String>) -> Self {
        Error::MissingDependency { name: name.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the blocking name if this is a `MissingDependency`
    pub fn missing_dependency(&self) -> Option<&str> {
        match self {
            Error::MissingDependency { name } => Some(name),
            _ => None,
        }
    }

    /// Whether a later pass (or more caller input) could clear this error
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Error::MissingDependency { .. })
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::CyclicDependency { .. } => ErrorSeverity::Fatal,
            Error::NoValidBumpFound { .. } => ErrorSeverity::Fatal,
            Error::InvalidSeedEncoding { .. } => ErrorSeverity::Fatal,
            Error::MaxSeedLengthExceeded { .. } => ErrorSeverity::Fatal,
            Error::TooManySeeds { .. } => ErrorSeverity::Fatal,
            Error::UnsupportedSeed { .. } => ErrorSeverity::Fatal,
            Error::DuplicateAccount { .. } => ErrorSeverity::Fatal,
            Error::IdlParse(_) => ErrorSeverity::Fatal,

            Error::MissingDependency { .. } => ErrorSeverity::Recoverable,
            Error::InvalidArgument { .. } => ErrorSeverity::Recoverable,
            Error::PassLimitReached { .. } => ErrorSeverity::Recoverable,
            Error::InvalidAddress { .. } => ErrorSeverity::Recoverable,

            Error::InvalidSeeds => ErrorSeverity::Warning,

            _ => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for account resolution operations
pub type Result<T> = std::result::Result<T, Error>;
