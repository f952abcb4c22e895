//! Common types used across CLI modules

use uuid::Uuid;

/// How the user named a workspace or pipeline on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Either a short code or a UUID prefix
    Partial(String),
}

impl IdOrPrefix {
    /// Parse a full UUID, otherwise keep the raw text for matching
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Partial(input.trim().to_string()),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            IdOrPrefix::Full(uuid) => Some(*uuid),
            IdOrPrefix::Partial(_) => None,
        }
    }

    /// Whether an entity with this id and code is the one being named.
    ///
    /// Codes compare case-insensitively and take precedence; otherwise the
    /// input is treated as a UUID prefix.
    pub fn matches(&self, id: Uuid, code: &str) -> bool {
        match self {
            IdOrPrefix::Full(uuid) => *uuid == id,
            IdOrPrefix::Partial(text) => {
                code.eq_ignore_ascii_case(text)
                    || id.to_string().starts_with(&text.to_lowercase())
            }
        }
    }

    /// Whether the input equals `code` exactly (ignoring case)
    pub fn is_code(&self, code: &str) -> bool {
        matches!(self, IdOrPrefix::Partial(text) if code.eq_ignore_ascii_case(text))
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Partial(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(id));
    }

    #[test]
    fn test_matches_code_case_insensitively() {
        let id = Uuid::new_v4();
        let input = IdOrPrefix::parse("ab12");
        assert!(input.matches(id, "AB12"));
        assert!(input.is_code("AB12"));
    }

    #[test]
    fn test_matches_uuid_prefix() {
        let id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        assert!(IdOrPrefix::parse("3F2A").matches(id, "ZZZZ"));
        assert!(!IdOrPrefix::parse("3f2b").matches(id, "ZZZZ"));
    }
}
