use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures of the command-line plumbing around a translation.
#[derive(Debug)]
pub enum CliError {
    Io { path: PathBuf, source: io::Error },
    SourceTooLarge { path: PathBuf, size: u64, limit: usize },
    /// The source is not UTF-8. `line` is 1-based; `offset` is the first bad byte.
    InvalidUtf8 { path: PathBuf, line: usize, offset: usize },
    Config { path: PathBuf, message: String },
    CompilerSpawn { cc: String, source: io::Error },
    Compiler { cc: String, code: Option<i32> },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, source } => write!(f, "'{}': {}", path.display(), source),
            CliError::SourceTooLarge { path, size, limit } => write!(
                f,
                "[SizeError] '{}' is {} bytes, larger than the {} byte limit",
                path.display(),
                size,
                limit
            ),
            CliError::InvalidUtf8 { path, line, offset } => write!(
                f,
                "[EncodingError] '{}' is not valid UTF-8: invalid byte on line {} (offset {}); re-save the file as UTF-8",
                path.display(),
                line,
                offset
            ),
            CliError::Config { path, message } => {
                write!(f, "invalid config '{}': {}", path.display(), message)
            }
            CliError::CompilerSpawn { cc, source } => {
                write!(f, "cannot run C compiler '{}': {}", cc, source)
            }
            CliError::Compiler { cc, code: Some(code) } => {
                write!(f, "C compiler '{}' failed with exit code {}", cc, code)
            }
            CliError::Compiler { cc, code: None } => {
                write!(f, "C compiler '{}' was terminated by a signal", cc)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io { source, .. } | CliError::CompilerSpawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
