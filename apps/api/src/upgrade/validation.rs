//! Boundary validation for upgrade-request submissions.

use crate::models::upgrade::PaymentMethod;

pub const MIN_TRANSACTION_ID_LEN: usize = 8;
pub const MAX_TRANSACTION_ID_LEN: usize = 128;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_PAYMENT_NUMBER_LEN: usize = 20;

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace. Real verification belongs to the identity provider; this
/// only rejects obviously malformed input at the boundary.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|part| !part.is_empty())
}

pub struct SubmissionFields<'a> {
    pub user_id: &'a str,
    pub user_email: &'a str,
    pub user_name: Option<&'a str>,
    pub transaction_id: &'a str,
    pub payment_method: &'a str,
    pub payment_number: &'a str,
    pub amount: i32,
}

/// Validates a submission against field shapes and the expected payment
/// amount. Returns the parsed payment method on success.
pub fn validate_submission(
    fields: &SubmissionFields<'_>,
    expected_amount: i32,
) -> Result<PaymentMethod, String> {
    if fields.user_id.trim().is_empty() {
        return Err("user_id must not be empty".to_string());
    }
    if !is_valid_email(fields.user_email) {
        return Err("user_email is not a valid email address".to_string());
    }
    if let Some(name) = fields.user_name {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("user_name must be at most {MAX_NAME_LEN} characters"));
        }
    }

    let txid = fields.transaction_id.trim();
    if txid.chars().count() < MIN_TRANSACTION_ID_LEN {
        return Err(format!(
            "transaction_id must be at least {MIN_TRANSACTION_ID_LEN} characters"
        ));
    }
    if txid.chars().count() > MAX_TRANSACTION_ID_LEN {
        return Err(format!(
            "transaction_id must be at most {MAX_TRANSACTION_ID_LEN} characters"
        ));
    }

    let method = PaymentMethod::parse(fields.payment_method)
        .ok_or_else(|| format!("unknown payment_method '{}'", fields.payment_method))?;

    let number = fields.payment_number.trim();
    if number.is_empty() || number.chars().count() > MAX_PAYMENT_NUMBER_LEN {
        return Err("payment_number must be a valid mobile account number".to_string());
    }
    if !number
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'))
    {
        return Err("payment_number must contain digits only".to_string());
    }

    if fields.amount != expected_amount {
        return Err(format!("amount must be exactly {expected_amount}"));
    }

    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(txid: &'a str, email: &'a str) -> SubmissionFields<'a> {
        SubmissionFields {
            user_id: "user-1",
            user_email: email,
            user_name: Some("Test User"),
            transaction_id: txid,
            payment_method: "bkash",
            payment_number: "01712345678",
            amount: 299,
        }
    }

    #[test]
    fn test_valid_submission() {
        assert_eq!(
            validate_submission(&fields("TXN1234567", "u@example.com"), 299),
            Ok(PaymentMethod::Bkash)
        );
    }

    #[test]
    fn test_short_transaction_id_rejected() {
        assert!(validate_submission(&fields("TX12345", "u@example.com"), 299).is_err());
    }

    #[test]
    fn test_eight_char_transaction_id_accepted() {
        assert!(validate_submission(&fields("TX123456", "u@example.com"), 299).is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        for email in ["", "plain", "@nodomain.com", "user@", "user@host", "a b@c.com"] {
            assert!(
                validate_submission(&fields("TXN1234567", email), 299).is_err(),
                "accepted {email:?}"
            );
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name+tag@sub.example.co"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn test_unknown_payment_method_rejected() {
        let mut f = fields("TXN1234567", "u@example.com");
        f.payment_method = "paypal";
        assert!(validate_submission(&f, 299).is_err());
    }

    #[test]
    fn test_wrong_amount_rejected() {
        let mut f = fields("TXN1234567", "u@example.com");
        f.amount = 300;
        assert!(validate_submission(&f, 299).is_err());
    }

    #[test]
    fn test_non_numeric_payment_number_rejected() {
        let mut f = fields("TXN1234567", "u@example.com");
        f.payment_number = "017-123-456";
        assert!(validate_submission(&f, 299).is_err());
    }

    #[test]
    fn test_payment_number_with_country_prefix_accepted() {
        let mut f = fields("TXN1234567", "u@example.com");
        f.payment_number = "+8801712345678";
        assert!(validate_submission(&f, 299).is_ok());
    }
}
