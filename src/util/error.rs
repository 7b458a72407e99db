// ZSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every fatal condition of a scan (unreachable root, malformed Z capture,
// plate names that break the rig convention) has its own variant so the
// binary can report the full causal chain before exiting.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ZSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ZSleuthError {
    /// Grammar loading or validation failed.
    Grammar(GrammarError),

    /// Directory traversal failed.
    Discovery(DiscoveryError),

    /// A file name matched but its fields could not be converted.
    Extract(ExtractError),

    /// Rig grouping failed.
    Group(GroupError),

    /// Table export failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// The chart window could not be opened.
    Gui { message: String },
}

impl fmt::Display for ZSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grammar(e) => write!(f, "Grammar error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Extract(e) => write!(f, "Extraction error: {e}"),
            Self::Group(e) => write!(f, "Grouping error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Gui { message } => write!(f, "Display error: {message}"),
        }
    }
}

impl std::error::Error for ZSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grammar(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Group(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Gui { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar errors
// ---------------------------------------------------------------------------

/// Errors related to filename grammar loading and validation.
#[derive(Debug)]
pub enum GrammarError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Grammar file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField {
        grammar_id: String,
        field: &'static str,
    },

    /// A regex pattern in the grammar is invalid.
    InvalidRegex {
        grammar_id: String,
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },

    /// A regex pattern exceeds the maximum allowed length.
    RegexTooLong {
        grammar_id: String,
        field: &'static str,
        length: usize,
        max_length: usize,
    },

    /// A regex pattern lacks the named capture group its field requires.
    MissingCaptureGroup {
        grammar_id: String,
        field: &'static str,
        group: &'static str,
    },

    /// A file-name glob pattern is invalid.
    InvalidGlob {
        grammar_id: String,
        pattern: String,
        source: glob::PatternError,
    },

    /// `plate_prefix_len` was set to zero.
    ZeroPlatePrefix { grammar_id: String },

    /// I/O error reading a grammar file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Grammar '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { grammar_id, field } => {
                write!(f, "Grammar '{grammar_id}': missing required field '{field}'")
            }
            Self::InvalidRegex {
                grammar_id,
                field,
                pattern,
                source,
            } => write!(
                f,
                "Grammar '{grammar_id}': invalid regex in '{field}' ('{pattern}'): {source}"
            ),
            Self::RegexTooLong {
                grammar_id,
                field,
                length,
                max_length,
            } => write!(
                f,
                "Grammar '{grammar_id}': regex in '{field}' is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::MissingCaptureGroup {
                grammar_id,
                field,
                group,
            } => write!(
                f,
                "Grammar '{grammar_id}': '{field}' must define a (?P<{group}>...) capture group"
            ),
            Self::InvalidGlob {
                grammar_id,
                pattern,
                source,
            } => write!(
                f,
                "Grammar '{grammar_id}': invalid file pattern '{pattern}': {source}"
            ),
            Self::ZeroPlatePrefix { grammar_id } => {
                write!(f, "Grammar '{grammar_id}': plate_prefix_len must be at least 1")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading grammar '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::InvalidGlob { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<GrammarError> for ZSleuthError {
    fn from(e: GrammarError) -> Self {
        Self::Grammar(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to directory traversal.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the root path.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The root pre-flight check did not answer in time (unreachable share).
    Timeout { path: PathBuf, timeout_secs: u64 },

    /// The root directory itself could not be listed.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::Timeout { path, timeout_secs } => write!(
                f,
                "Scan path '{}' did not respond within {timeout_secs}s. \
                 Check that the network share is reachable.",
                path.display()
            ),
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for ZSleuthError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// A file name satisfied the grammar but a captured field is unusable.
/// These abort the run: the capture is structurally present, so silently
/// dropping the file would hide a naming-convention change.
#[derive(Debug)]
pub enum ExtractError {
    /// The `z` capture is not a number (e.g. `"."` or `"1.2.3"`).
    InvalidZValue {
        file: PathBuf,
        raw: String,
        source: std::num::ParseFloatError,
    },

    /// The `z` capture parsed but cannot be represented as an integer.
    ZOutOfRange { file: PathBuf, value: f64 },

    /// The file name is shorter than the grammar's plate prefix.
    PlateNameTooShort {
        file: PathBuf,
        length: usize,
        required: usize,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidZValue { file, raw, source } => write!(
                f,
                "'{}': cannot parse Z value '{raw}': {source}",
                file.display()
            ),
            Self::ZOutOfRange { file, value } => write!(
                f,
                "'{}': Z value {value} is outside the representable range",
                file.display()
            ),
            Self::PlateNameTooShort {
                file,
                length,
                required,
            } => write!(
                f,
                "'{}': file name has {length} characters, plate name needs {required}",
                file.display()
            ),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidZValue { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExtractError> for ZSleuthError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

// ---------------------------------------------------------------------------
// Grouping errors
// ---------------------------------------------------------------------------

/// Errors related to rig grouping.
#[derive(Debug)]
pub enum GroupError {
    /// The rig marker character of a plate name is missing or not a digit.
    NonDigitRigMarker {
        plate_name: String,
        index: usize,
        found: Option<char>,
    },
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonDigitRigMarker {
                plate_name,
                index,
                found: Some(c),
            } => write!(
                f,
                "Plate '{plate_name}': character {} is '{c}', expected a rig digit",
                index + 1
            ),
            Self::NonDigitRigMarker {
                plate_name,
                index,
                found: None,
            } => write!(
                f,
                "Plate '{plate_name}' is too short to carry a rig digit at position {}",
                index + 1
            ),
        }
    }
}

impl std::error::Error for GroupError {}

impl From<GroupError> for ZSleuthError {
    fn from(e: GroupError) -> Self {
        Self::Group(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to table export.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The export path has no recognised extension.
    UnknownFormat { path: PathBuf },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
            Self::UnknownFormat { path } => write!(
                f,
                "Cannot export to '{}': use a .csv or .json extension",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::UnknownFormat { .. } => None,
        }
    }
}

impl From<ExportError> for ZSleuthError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// No scan root was given on the CLI, in config, or via the picker.
    NoScanRoot,

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScanRoot => write!(
                f,
                "No scan directory given. Pass a PATH argument or set [scan] root in config.toml."
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NoScanRoot => None,
        }
    }
}

impl From<ConfigError> for ZSleuthError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ZSleuth results.
pub type Result<T> = std::result::Result<T, ZSleuthError>;
