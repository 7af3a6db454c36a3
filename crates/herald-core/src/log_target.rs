//! Per-request log target naming.
//!
//! Each request is assigned a log target name derived from its correlation
//! identity and the UTC time it was tagged:
//!
//! ```text
//! request_{identity}_{yyyyMMdd_HHmmssfff}
//! ```
//!
//! The name is advisory metadata for log sinks and never affects the
//! response.

use crate::identity::CorrelationId;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Directory log targets are placed under unless configured otherwise.
pub const DEFAULT_LOG_DIRECTORY: &str = "Logs";

/// File extension appended to the log target name to form its path.
pub const LOG_FILE_EXTENSION: &str = "log";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";

/// The log target assigned to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    name: String,
    path: PathBuf,
}

impl LogTarget {
    /// Builds the log target for `identity` tagged at `at`.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use herald_core::{CorrelationId, LogTarget};
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    /// let target = LogTarget::new(&CorrelationId::unknown(), at, "Logs");
    /// assert_eq!(target.name(), "request_Unknown_20240309_140507000");
    /// ```
    #[must_use]
    pub fn new(identity: &CorrelationId, at: DateTime<Utc>, directory: impl AsRef<Path>) -> Self {
        let name = format_name(identity, at);
        let path = directory
            .as_ref()
            .join(format!("{name}.{LOG_FILE_EXTENSION}"));
        Self { name, path }
    }

    /// Returns the log target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path a file sink would write this request's log to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for LogTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn format_name(identity: &CorrelationId, at: DateTime<Utc>) -> String {
    format!("request_{}_{}", identity, at.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;
    use chrono::{Duration, TimeZone};

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 58).unwrap() + Duration::milliseconds(7)
    }

    #[test]
    fn test_name_includes_milliseconds() {
        let identity = CorrelationId::from_principal(Some(&Principal::new("user-9")));
        let target = LogTarget::new(&identity, fixed_time(), DEFAULT_LOG_DIRECTORY);
        assert_eq!(target.name(), "request_user-9_20250131_235958007");
    }

    #[test]
    fn test_unknown_identity_name() {
        let target = LogTarget::new(&CorrelationId::unknown(), fixed_time(), "Logs");
        assert_eq!(target.name(), "request_Unknown_20250131_235958007");
    }

    #[test]
    fn test_path_under_directory() {
        let target = LogTarget::new(&CorrelationId::unknown(), fixed_time(), "/var/log/herald");
        assert_eq!(
            target.path(),
            Path::new("/var/log/herald/request_Unknown_20250131_235958007.log")
        );
    }

    #[test]
    fn test_name_shape_for_current_time() {
        let target = LogTarget::new(&CorrelationId::unknown(), Utc::now(), "Logs");
        let pattern = regex::Regex::new(r"^request_Unknown_\d{8}_\d{9}$").unwrap();
        assert!(pattern.is_match(target.name()), "{}", target.name());
    }

    #[test]
    fn test_display_is_name() {
        let target = LogTarget::new(&CorrelationId::unknown(), fixed_time(), "Logs");
        assert_eq!(target.to_string(), target.name());
    }
}
