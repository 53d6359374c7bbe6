//! Domain error types.

/// Top-level error type for trademap.
#[derive(Debug, thiserror::Error)]
pub enum TradeMapError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("import error at line {line}: {reason}")]
    Import { line: u64, reason: String },

    #[error("no trade data for country '{name}'")]
    CountryNotFound { name: String },

    #[error("company '{name}' not found")]
    CompanyNotFound { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradeMapError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        TradeMapError::Database {
            reason: err.to_string(),
        }
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        TradeMapError::DatabaseQuery {
            reason: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TradeMapError::CountryNotFound { .. } | TradeMapError::CompanyNotFound { .. }
        )
    }
}

impl From<&TradeMapError> for std::process::ExitCode {
    fn from(err: &TradeMapError) -> Self {
        let code: u8 = match err {
            TradeMapError::Io(_) => 1,
            TradeMapError::ConfigParse { .. }
            | TradeMapError::ConfigMissing { .. }
            | TradeMapError::ConfigInvalid { .. } => 2,
            TradeMapError::Database { .. } | TradeMapError::DatabaseQuery { .. } => 3,
            TradeMapError::Import { .. } => 4,
            TradeMapError::CountryNotFound { .. } | TradeMapError::CompanyNotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = TradeMapError::ConfigInvalid {
            section: "stats".into(),
            key: "country_top_n".into(),
            reason: "must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [stats] country_top_n: must be at least 1"
        );

        let err = TradeMapError::Import {
            line: 7,
            reason: "bad header".into(),
        };
        assert_eq!(err.to_string(), "import error at line 7: bad header");
    }

    #[test]
    fn not_found_classification() {
        assert!(TradeMapError::CountryNotFound { name: "X".into() }.is_not_found());
        assert!(TradeMapError::CompanyNotFound { name: "X".into() }.is_not_found());
        assert!(!TradeMapError::database("boom").is_not_found());
    }

    #[test]
    fn helper_constructors_capture_message() {
        match TradeMapError::query("syntax error") {
            TradeMapError::DatabaseQuery { reason } => assert_eq!(reason, "syntax error"),
            other => panic!("unexpected: {other}"),
        }
    }
}
