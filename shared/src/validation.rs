//! Validation utilities for certificates and templates

/// Length of the random suffix of a certificate number
pub const CERTIFICATE_SUFFIX_LEN: usize = 8;

/// Maximum length of a template name
pub const MAX_TEMPLATE_NAME_LEN: usize = 255;

/// Maximum length of a revocation reason
pub const MAX_REVOKE_REASON_LEN: usize = 1000;

/// Validate a certificate number of the form `<PREFIX><YEAR><8 base36 chars>`
pub fn validate_certificate_number(number: &str, prefix: &str) -> Result<(), &'static str> {
    let Some(rest) = number.strip_prefix(prefix) else {
        return Err("Certificate number has the wrong prefix");
    };
    if rest.len() != 4 + CERTIFICATE_SUFFIX_LEN {
        return Err("Certificate number has the wrong length");
    }
    let (year, suffix) = rest.split_at(4);
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return Err("Certificate number year must be four digits");
    }
    if !suffix
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        return Err("Certificate number suffix must be uppercase base36");
    }
    Ok(())
}

/// Validate a certificate number prefix from configuration
pub fn validate_number_prefix(prefix: &str) -> Result<(), &'static str> {
    if prefix.is_empty() || prefix.len() > 10 {
        return Err("Certificate number prefix must be 1-10 characters");
    }
    if !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Certificate number prefix must be uppercase letters only");
    }
    Ok(())
}

/// Validate template display name
pub fn validate_template_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Template name is required");
    }
    if trimmed.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err("Template name is too long");
    }
    Ok(())
}

/// Validate the human-readable reason stored with a revocation
pub fn validate_revoke_reason(reason: &str) -> Result<(), &'static str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err("Revocation reason is required");
    }
    if trimmed.chars().count() > MAX_REVOKE_REASON_LEN {
        return Err("Revocation reason is too long");
    }
    Ok(())
}
