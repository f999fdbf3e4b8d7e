use super::{ServiceError, ServiceResult};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Basic email shape check: one `@`, non-empty local part, dotted domain.
pub fn validate_email_format(email: &str) -> ServiceResult<()> {
    if email.is_empty() {
        return Err(ServiceError::invalid_field("email", "Email cannot be empty"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(ServiceError::invalid_field("email", "Invalid email format")),
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ServiceError::invalid_field("email", "Invalid email format"));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::invalid_field("name", "Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ServiceError::invalid_field(
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, min_length: usize) -> ServiceResult<()> {
    if password.chars().count() < min_length {
        return Err(ServiceError::invalid_field(
            "password",
            format!("Password must be at least {} characters", min_length),
        ));
    }
    Ok(())
}

/// Free-text fields (description, bio, review) are bounded.
pub fn validate_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ServiceError::invalid_field(
            field,
            format!("{} must be at most {} characters", field, MAX_TEXT_LENGTH),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_emails() {
        assert!(validate_email_format("ravi.plumber@example.com").is_ok());
        assert!(validate_email_format("a+b@sub.example.co.in").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "plain", "@example.com", "a@", "a@b", "a@@b.com", "a@b..com", "a b@c.com", "a@.com"] {
            assert!(validate_email_format(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn names_and_passwords() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_name("Sita Rao").is_ok());
        assert!(validate_password("12345", 6).is_err());
        assert!(validate_password("123456", 6).is_ok());
    }

    #[test]
    fn field_is_reported() {
        match validate_password("x", 8) {
            Err(ServiceError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("password")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
