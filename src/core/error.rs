//! Error types for relgate with contextual messages and exit codes
//!
//! Fatal run errors (I/O, git transport, configuration) live here. Expected
//! validation findings are not errors in this sense; rules record those as
//! diagnostics on the validation context and keep going.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for relgate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad arguments, missing files, broken configuration)
  User = 1,
  /// System error (git transport, I/O)
  System = 2,
  /// Validation failure (one or more errors recorded against the input)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for relgate
#[derive(Debug)]
pub enum GateError {
  /// Configuration errors
  Config(ConfigError),

  /// Git transport and repository errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message { message: String, context: Option<String> },
}

impl GateError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    GateError::Message {
      message: msg.into(),
      context: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      GateError::Message { message, context } => GateError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      GateError::Config(_) => ExitCode::User,
      GateError::Git(_) => ExitCode::System,
      GateError::Io(_) => ExitCode::System,
      GateError::Message { .. } => ExitCode::User,
    }
  }
}

impl fmt::Display for GateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GateError::Config(e) => write!(f, "{}", e),
      GateError::Git(e) => write!(f, "{}", e),
      GateError::Io(e) => write!(f, "I/O error: {}", e),
      GateError::Message { message, context } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for GateError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GateError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for GateError {
  fn from(err: io::Error) -> Self {
    GateError::Io(err)
  }
}

impl From<String> for GateError {
  fn from(msg: String) -> Self {
    GateError::message(msg)
  }
}

impl From<&str> for GateError {
  fn from(msg: &str) -> Self {
    GateError::message(msg)
  }
}

impl From<serde_yaml::Error> for GateError {
  fn from(err: serde_yaml::Error) -> Self {
    GateError::message(format!("YAML error: {}", err))
  }
}

impl From<serde_json::Error> for GateError {
  fn from(err: serde_json::Error) -> Self {
    GateError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for GateError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    GateError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<anyhow::Error> for GateError {
  fn from(err: anyhow::Error) -> Self {
    GateError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Deliverable file not found
  FileNotFound { path: PathBuf },

  /// Deliverables root directory missing or unreadable
  RootNotFound { path: PathBuf },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::FileNotFound { path } => {
        write!(f, "Deliverable file not found: {}", path.display())
      }
      ConfigError::RootNotFound { path } => {
        write!(f, "Deliverables directory not found: {}", path.display())
      }
    }
  }
}

/// Git transport and repository errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Clone/fetch of a remote repository failed
  CloneFailed { repo: String, reason: String },

  /// Operation exceeded its transport timeout
  Timeout { repo: String, seconds: u64 },

  /// A reference was required to exist but does not
  RefNotFound { repo: String, reference: String },
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::CloneFailed { repo, reason } => {
        write!(f, "Cloning {} failed: {}", repo, reason)
      }
      GitError::Timeout { repo, seconds } => {
        write!(f, "Git operation on {} timed out after {}s", repo, seconds)
      }
      GitError::RefNotFound { repo, reference } => {
        write!(f, "Reference {:?} not found in {}", reference, repo)
      }
    }
  }
}

/// Result type alias for relgate
pub type GateResult<T> = Result<T, GateError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> GateResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> GateResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<GateError>,
{
  fn context(self, ctx: impl Into<String>) -> GateResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> GateResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr
pub fn print_error(error: &GateError) {
  eprintln!("\n❌ {}\n", error);
}
