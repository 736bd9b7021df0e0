// Copyright 2025
// Licensed under the Elastic License v2.0

use std::fmt;

/// Error taxonomy for the loader subsystem.
///
/// Every variant maps to a distinct failure class with its own retry and
/// exit-code semantics. Driver and orchestrator code surfaces these through
/// `anyhow` chains; `main` downcasts the chain root to pick the process
/// exit code.
#[derive(Debug)]
pub enum EtlError {
    /// Bad connection string, unsupported scheme, missing required option.
    /// Non-retryable.
    Config {
        message: String,
    },

    /// Transport-level failure: unreachable endpoint, bad credentials,
    /// session lost mid-run.
    Connection {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Bulk load failed: protocol, constraint, timeout, or server error.
    Load {
        message: String,
        timed_out: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invariant violation detected in the data itself: duplicate business
    /// keys in staging, column count mismatch, parse-error budget exceeded.
    Data {
        message: String,
        offending_keys: Vec<String>,
    },

    /// Metadata write failed. Logged, never masks the run's real outcome.
    Audit {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
            timed_out: false,
            source: None,
        }
    }

    pub fn load_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Load {
            message: message.into(),
            timed_out: false,
            source: Some(Box::new(cause)),
        }
    }

    pub fn timed_out(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Load {
            message: message.into(),
            timed_out: true,
            source: Some(Box::new(cause)),
        }
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
            offending_keys: Vec::new(),
        }
    }

    pub fn data_with_keys(message: impl Into<String>, offending_keys: Vec<String>) -> Self {
        Self::Data {
            message: message.into(),
            offending_keys,
        }
    }

    pub fn audit_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Audit {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Process exit code for this error class: configuration problems exit
    /// with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            EtlError::Config { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtlError::Config { message } => write!(f, "Configuration error: {}", message),
            EtlError::Connection { message, source } => {
                write!(f, "Connection error: {}", message)?;
                if let Some(src) = source {
                    write!(f, " (caused by: {})", src)?;
                }
                Ok(())
            }
            EtlError::Load {
                message,
                timed_out,
                source,
            } => {
                if *timed_out {
                    write!(f, "Load error (timed out): {}", message)?;
                } else {
                    write!(f, "Load error: {}", message)?;
                }
                if let Some(src) = source {
                    write!(f, " (caused by: {})", src)?;
                }
                Ok(())
            }
            EtlError::Data {
                message,
                offending_keys,
            } => {
                write!(f, "Data error: {}", message)?;
                if !offending_keys.is_empty() {
                    write!(f, " [offending keys: {}]", offending_keys.join("; "))?;
                }
                Ok(())
            }
            EtlError::Audit { message, source } => {
                write!(f, "Audit error: {}", message)?;
                if let Some(src) = source {
                    write!(f, " (caused by: {})", src)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EtlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtlError::Connection { source, .. }
            | EtlError::Load { source, .. }
            | EtlError::Audit { source, .. } => {
                source.as_ref().map(|e| e.as_ref() as &dyn std::error::Error)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_carries_kind_prefix() {
        assert!(EtlError::config("bad scheme")
            .to_string()
            .starts_with("Configuration error:"));
        assert!(EtlError::connection("refused")
            .to_string()
            .starts_with("Connection error:"));
        assert!(EtlError::load("copy failed")
            .to_string()
            .starts_with("Load error:"));
        assert!(EtlError::data("dup keys")
            .to_string()
            .starts_with("Data error:"));
    }

    #[test]
    fn test_timed_out_flag_in_display() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "canceled");
        let err = EtlError::timed_out("cdc statement", io);
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_offending_keys_listed() {
        let err = EtlError::data_with_keys(
            "duplicate business keys in staging_concepts",
            vec!["C0001".to_string(), "C0002".to_string()],
        );
        let text = err.to_string();
        assert!(text.contains("C0001"));
        assert!(text.contains("C0002"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EtlError::config("x").exit_code(), 2);
        assert_eq!(EtlError::load("x").exit_code(), 1);
        assert_eq!(EtlError::data("x").exit_code(), 1);
    }

    #[test]
    fn test_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = EtlError::connection_with_cause("could not reach server", io);
        assert!(err.source().is_some());
        assert!(EtlError::config("no scheme").source().is_none());
    }
}
