//! Validation utilities for the Fireworks Order Management Platform
//!
//! Includes the India-specific mobile number handling the messaging
//! channel depends on.

use crate::models::{CustomerProfile, ExtraCharges, LineItem};

// ============================================================================
// Order Validations
// ============================================================================

/// Validate a set of booking/quotation line items: non-empty, positive
/// quantities, non-negative prices, discounts within 0-100.
pub fn validate_line_items(items: &[LineItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("Products array is required and must not be empty");
    }
    for item in items {
        if item.quantity < 1 {
            return Err("Each product must have a positive quantity");
        }
        if item.price.is_sign_negative() {
            return Err("Product price cannot be negative");
        }
        if item.discount.is_sign_negative() || item.discount > rust_decimal::Decimal::from(100) {
            return Err("Discount must be between 0 and 100");
        }
        if item.productname.trim().is_empty() {
            return Err("Each product must carry its name");
        }
    }
    Ok(())
}

/// Validate extra charges: tax, packing fee, and deduction must each be
/// non-negative. Whether the deduction leaves a sensible total is
/// checked against the computed total, not here.
pub fn validate_extra_charges(extra: &ExtraCharges) -> Result<(), &'static str> {
    if extra.tax.is_sign_negative() {
        return Err("Tax cannot be negative");
    }
    if extra.packing_fee.is_sign_negative() {
        return Err("Packing fee cannot be negative");
    }
    if extra.deduction.is_sign_negative() {
        return Err("Deduction cannot be negative");
    }
    Ok(())
}

/// Validate that a resolved customer profile is complete enough to book
/// against. Inline (walk-in) customers must supply every field.
pub fn validate_profile(profile: &CustomerProfile) -> Result<(), &'static str> {
    if profile.customer_name.trim().is_empty() {
        return Err("Customer name is required");
    }
    if profile.address.trim().is_empty() {
        return Err("Address is required");
    }
    if profile.district.trim().is_empty() {
        return Err("District is required");
    }
    if profile.state.trim().is_empty() {
        return Err("State is required");
    }
    validate_mobile_number(&profile.mobile_number)?;
    validate_email(&profile.email)?;
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a mobile number: at least 10 digits once whitespace is
/// stripped.
pub fn validate_mobile_number(mobile: &str) -> Result<(), &'static str> {
    let digits: String = mobile.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() >= 10 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Invalid mobile number format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Lowercase a customer name into a filesystem-safe slug used in
/// artifact filenames (`Ravi Kumar & Co` -> `ravi_kumar_co`).
pub fn sanitize_customer_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

// ============================================================================
// India-Specific Validations
// ============================================================================

/// Normalize a recipient number for the messaging channel.
/// Accepts: 9876543210, 98 7654 3210, 919876543210, +919876543210.
pub fn normalize_recipient_number(mobile: &str) -> Result<String, &'static str> {
    let trimmed: String = mobile.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(rest) = trimmed.strip_prefix('+') {
        if rest.len() >= 11 && rest.chars().all(|c| c.is_ascii_digit()) {
            return Ok(trimmed);
        }
        return Err("Invalid mobile number format");
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != trimmed.len() {
        return Err("Invalid mobile number format");
    }
    match digits.len() {
        10 => Ok(format!("+91{}", digits)),
        12 if digits.starts_with("91") => Ok(format!("+{}", digits)),
        _ => Err("Invalid mobile number format"),
    }
}
