//! Customer directory and profile resolution tests

use proptest::prelude::*;

use shared::models::{CustomerProfile, CustomerType};
use shared::validation::{
    normalize_recipient_number, sanitize_customer_name, validate_email, validate_mobile_number,
    validate_profile,
};

fn full_profile() -> CustomerProfile {
    CustomerProfile {
        customer_name: "Ravi Kumar & Co".to_string(),
        address: "12 Bazaar Street".to_string(),
        district: "Sivakasi".to_string(),
        state: "Tamil Nadu".to_string(),
        mobile_number: "9876543210".to_string(),
        email: "ravi@example.com".to_string(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_complete_profile_accepted() {
        assert!(validate_profile(&full_profile()).is_ok());
    }

    /// Walk-in (inline) customers must supply every field; each gap is
    /// a validation error.
    #[test]
    fn test_missing_fields_rejected() {
        let mut profile = full_profile();
        profile.address = String::new();
        assert!(validate_profile(&profile).is_err());

        let mut profile = full_profile();
        profile.district = "  ".to_string();
        assert!(validate_profile(&profile).is_err());

        let mut profile = full_profile();
        profile.mobile_number = "12345".to_string();
        assert!(validate_profile(&profile).is_err());

        let mut profile = full_profile();
        profile.email = "not-an-email".to_string();
        assert!(validate_profile(&profile).is_err());
    }

    #[test]
    fn test_customer_type_labels() {
        assert_eq!(CustomerType::from_str("User"), Some(CustomerType::User));
        assert_eq!(CustomerType::from_str("Agent"), Some(CustomerType::Agent));
        assert_eq!(
            CustomerType::from_str("Customer of Selected Agent"),
            Some(CustomerType::CustomerOfAgent)
        );
        assert_eq!(CustomerType::from_str("customer"), None);
        assert_eq!(CustomerType::default(), CustomerType::User);
    }

    #[test]
    fn test_mobile_number_validation() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("98 7654 3210").is_ok());
        assert!(validate_mobile_number("987654321").is_err());
        assert!(validate_mobile_number("98765abcde").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("dealer@example.com").is_ok());
        assert!(validate_email("dealer").is_err());
        assert!(validate_email("a@b").is_err());
    }

    /// Recipient normalization for the messaging channel.
    #[test]
    fn test_recipient_normalization() {
        assert_eq!(
            normalize_recipient_number("9876543210").unwrap(),
            "+919876543210"
        );
        assert_eq!(
            normalize_recipient_number("919876543210").unwrap(),
            "+919876543210"
        );
        assert_eq!(
            normalize_recipient_number("+919876543210").unwrap(),
            "+919876543210"
        );
        assert!(normalize_recipient_number("12345").is_err());
        assert!(normalize_recipient_number("009876543210").is_err());
    }

    /// Artifact filenames derive from the customer name.
    #[test]
    fn test_name_sanitization() {
        assert_eq!(sanitize_customer_name("Ravi Kumar & Co"), "ravi_kumar_co");
        assert_eq!(sanitize_customer_name("SRI Vel Traders"), "sri_vel_traders");
        assert_eq!(sanitize_customer_name("!!!"), "");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Sanitized names are always safe to put in a filename.
        #[test]
        fn prop_sanitized_names_filesystem_safe(name in ".{0,60}") {
            let slug = sanitize_customer_name(&name);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!slug.ends_with('_'));
        }

        /// Every accepted 10-digit number normalizes to +91 form, and
        /// normalization is idempotent.
        #[test]
        fn prop_normalization_idempotent(digits in proptest::collection::vec(0u8..10, 10)) {
            let number: String = digits.iter().map(|d| d.to_string()).collect();
            // Avoid the 12-digit special case by construction (10 digits)
            let normalized = normalize_recipient_number(&number).unwrap();
            prop_assert_eq!(normalized.len(), 13);
            prop_assert!(normalized.starts_with("+91"));
            let again = normalize_recipient_number(&normalized).unwrap();
            prop_assert_eq!(again, normalized);
        }

        /// Blank-field profiles are always rejected.
        #[test]
        fn prop_blank_name_rejected(padding in " {0,10}") {
            let mut profile = full_profile();
            profile.customer_name = padding;
            prop_assert!(validate_profile(&profile).is_err());
        }
    }
}
