//! New-name validation for rename targets.

use thiserror::Error;

/// Validation failures for proposed method names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The proposed name is not a valid method name.
    #[error("invalid method name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reserved words that cannot be used as method names.
const RESERVED_WORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or", "redo",
    "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield",
];

/// Check if a name is a reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Validate a proposed method name.
///
/// Method names are an identifier (letter or underscore, then letters,
/// digits, or underscores) with at most one trailing `?`, `!`, or `=`.
/// Reserved words are rejected.
pub fn validate_method_name(name: &str) -> ValidationResult<()> {
    let invalid = |reason: &str| {
        Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("name is empty");
    }
    if is_reserved_word(name) {
        return invalid("name is a reserved word");
    }

    let core = name
        .strip_suffix(&['?', '!', '='][..])
        .unwrap_or(name);
    if core.is_empty() {
        return invalid("name has no identifier before the suffix");
    }

    let mut chars = core.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return invalid("name is empty"),
    };
    if !first.is_alphabetic() && first != '_' {
        return invalid("name must start with a letter or underscore");
    }
    for c in chars {
        if !c.is_alphanumeric() && c != '_' {
            return invalid("name contains an invalid character");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_method_name("bar").is_ok());
        assert!(validate_method_name("_private").is_ok());
        assert!(validate_method_name("foo2").is_ok());
        assert!(validate_method_name("snake_case_name").is_ok());
    }

    #[test]
    fn accepts_suffixed_forms() {
        assert!(validate_method_name("empty?").is_ok());
        assert!(validate_method_name("save!").is_ok());
        assert!(validate_method_name("name=").is_ok());
    }

    #[test]
    fn rejects_empty_and_bare_suffix() {
        assert!(validate_method_name("").is_err());
        assert!(validate_method_name("?").is_err());
        assert!(validate_method_name("=").is_err());
    }

    #[test]
    fn rejects_bad_first_character() {
        assert!(validate_method_name("1foo").is_err());
        assert!(validate_method_name("-foo").is_err());
    }

    #[test]
    fn rejects_interior_punctuation() {
        assert!(validate_method_name("foo-bar").is_err());
        assert!(validate_method_name("foo.bar").is_err());
        assert!(validate_method_name("foo bar").is_err());
        // Suffix characters are only valid at the end.
        assert!(validate_method_name("fo?o").is_err());
    }

    #[test]
    fn rejects_reserved_words() {
        assert!(validate_method_name("class").is_err());
        assert!(validate_method_name("def").is_err());
        assert!(validate_method_name("end").is_err());
        assert!(validate_method_name("defined?").is_err());
        // A reserved word plus a suffix is a different name.
        assert!(validate_method_name("class?").is_ok());
    }

    #[test]
    fn reserved_word_lookup() {
        assert!(is_reserved_word("yield"));
        assert!(!is_reserved_word("bar"));
    }
}
