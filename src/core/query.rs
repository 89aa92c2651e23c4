use crate::error::{GuidanceError, Result};

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 500;

/// A validated natural-language query (e.g. "I feel anxious and need comfort")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceQuery(String);

impl GuidanceQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        let len = text.chars().count();

        if len < MIN_QUERY_CHARS {
            return Err(GuidanceError::validation(format!(
                "query must be at least {} characters",
                MIN_QUERY_CHARS
            )));
        }
        if len > MAX_QUERY_CHARS {
            return Err(GuidanceError::validation(format!(
                "query must be at most {} characters (got {})",
                MAX_QUERY_CHARS, len
            )));
        }

        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(GuidanceQuery::parse("  hi ").is_err());
        assert!(GuidanceQuery::parse(&"a".repeat(501)).is_err());
        assert_eq!(
            GuidanceQuery::parse("  I feel anxious ").unwrap().as_str(),
            "I feel anxious"
        );
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 3 Arabic letters are 6 bytes
        assert!(GuidanceQuery::parse("صبر").is_ok());
    }
}
