//! Java runtime detection.

use std::path::Path;

use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

/// Oldest Java major version modern servers run on.
pub const MIN_JAVA_MAJOR: u32 = 17;

/// Result of probing a Java executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaCheck {
    /// Java ran and is new enough.
    pub ok: bool,
    pub major: Option<u32>,
    /// First line of `java -version`, or the launch error.
    pub output: String,
}

/// Run `<java> -version` and parse the major version.
pub async fn check_java(java: &Path) -> JavaCheck {
    let output = match Command::new(java).arg("-version").output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(java = %java.display(), error = %e, "Java not runnable");
            return JavaCheck {
                ok: false,
                major: None,
                output: format!("Failed to run {}: {e}", java.display()),
            };
        }
    };

    // java -version prints to stderr
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    let first_line = text.lines().next().unwrap_or_default().trim().to_string();
    let major = parse_major_version(&text);

    JavaCheck {
        ok: output.status.success() && major.is_some_and(|m| m >= MIN_JAVA_MAJOR),
        major,
        output: first_line,
    }
}

/// Extract the major version from `java -version` output.
///
/// `"1.8.0_392"` is Java 8; `"17.0.9"` and `"21"` are 17 and 21.
pub fn parse_major_version(text: &str) -> Option<u32> {
    let start = text.find('"')? + 1;
    let end = start + text[start..].find('"')?;
    let version = &text[start..end];

    let mut parts = version.split(['.', '_', '-', '+']);
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modern_version() {
        let text = "openjdk version \"17.0.9\" 2023-10-17\nOpenJDK Runtime Environment";
        assert_eq!(parse_major_version(text), Some(17));
        assert_eq!(parse_major_version("java version \"21\" 2023-09-19"), Some(21));
        assert_eq!(
            parse_major_version("openjdk version \"22-ea\" 2024-03-19"),
            Some(22)
        );
    }

    #[test]
    fn test_parse_legacy_version() {
        assert_eq!(
            parse_major_version("java version \"1.8.0_392\""),
            Some(8)
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_major_version("command not found"), None);
        assert_eq!(parse_major_version("version \"abc\""), None);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let check = check_java(Path::new("/nonexistent/bin/java")).await;
        assert!(!check.ok);
        assert!(check.major.is_none());
        assert!(check.output.starts_with("Failed to run"));
    }
}
