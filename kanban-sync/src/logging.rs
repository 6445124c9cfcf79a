//! Logging helpers

use serde::Serialize;
use std::fmt::Debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Wrapper for pretty-printing values in logs as YAML
///
/// ```ignore
/// use kanban_sync::Pretty;
/// use tracing::debug;
///
/// debug!("reconciled {}", Pretty(&columns));
/// ```
///
/// Output starts with a newline. Falls back to `{:#?}` when the value does
/// not serialize.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`, or `default_filter` when
/// unset. Does nothing if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    #[test]
    fn test_pretty_renders_yaml() {
        let column = Column::new("1", "Todo", "b").with_position(0);
        let rendered = format!("{}", Pretty(&column));
        assert!(rendered.starts_with('\n'));
        assert!(rendered.contains("title: Todo"));
        assert!(rendered.contains("boardId: b"));
    }
}
