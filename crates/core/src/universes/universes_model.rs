use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// A named, user-managed group of contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Universe together with its member count, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseSummary {
    pub name: String,
    pub description: Option<String>,
    pub member_count: usize,
}

/// Names may not be blank or contain whitespace, so they stay usable as CLI arguments.
pub fn validate_universe_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "universe name".to_string(),
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "universe name '{}' must not contain whitespace",
            name
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_universe_name() {
        assert!(validate_universe_name("us_large_caps").is_ok());
        assert!(validate_universe_name("").is_err());
        assert!(validate_universe_name("us large").is_err());
    }
}
