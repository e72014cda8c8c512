use regex::Regex;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("record name is empty")]
    Empty,
    #[error("record name too long (max 253 characters)")]
    TooLong,
    #[error("label too long (max 63 characters)")]
    LabelTooLong,
    #[error("record name contains an empty label")]
    EmptyLabel,
    #[error("record name contains invalid characters (only letters, digits, '-' and '_' allowed)")]
    InvalidCharacters,
    #[error("label must not start or end with '-'")]
    LeadingOrTrailingHyphen,
}

lazy_static::lazy_static! {
    /// Letters, digits, '-' and '_' ('_' covers TXT/ACME-style labels)
    static ref LABEL_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

pub fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label.is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    // A lone '*' is a wildcard label.
    if label == "*" {
        return Ok(());
    }
    if label.len() > 63 {
        return Err(ValidationError::LabelTooLong);
    }
    if !LABEL_RE.is_match(label) {
        return Err(ValidationError::InvalidCharacters);
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(ValidationError::LeadingOrTrailingHyphen);
    }

    Ok(())
}

/// Validate a record name as entered in the wizard or the RPC surface.
///
/// `@` denotes the zone apex and is always valid. A trailing dot (FQDN
/// notation) is accepted and ignored.
pub fn validate_record_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed == "@" {
        return Ok(());
    }

    let bare = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if bare.is_empty() {
        return Err(ValidationError::Empty);
    }
    if bare.len() > 253 {
        return Err(ValidationError::TooLong);
    }
    for label in bare.split('.') {
        validate_label(label)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        assert!(validate_record_name("@").is_ok());
        assert!(validate_record_name("www").is_ok());
        assert!(validate_record_name("sub.example.com").is_ok());
        assert!(validate_record_name("_acme-challenge.example.com").is_ok());
        assert!(validate_record_name("*.example.com").is_ok());
        assert!(validate_record_name("example.com.").is_ok());
        assert!(validate_record_name(&("a".repeat(63) + ".com")).is_ok());
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(validate_record_name("").is_err());
        assert!(validate_record_name(" ").is_err());
        assert!(validate_record_name("bad name").is_err());
        assert!(validate_record_name(".example.com").is_err());
        assert!(validate_record_name("example..com").is_err());
        assert!(validate_record_name("-example.com").is_err());
        assert!(validate_record_name("example-.com").is_err());
        assert!(validate_record_name("ex!mple.com").is_err());
        assert!(validate_record_name(&("a".repeat(64) + ".com")).is_err());
        assert!(validate_record_name(&"a.".repeat(254)).is_err());
    }
}
