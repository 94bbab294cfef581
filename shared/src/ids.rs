//! Identifier formats for orders, quotations, and receipts
//!
//! Order and quotation ids carry a millisecond timestamp suffix behind a
//! fixed prefix (`ORD-1751548161837`, `EST-1751548161837`). Promoting a
//! quotation to a booking substitutes the prefix and preserves the
//! suffix, so the two documents stay correlated. Everywhere else the ids
//! are treated as opaque URL-safe strings.

use chrono::Utc;

/// Prefix for booking order ids.
pub const ORDER_ID_PREFIX: &str = "ORD";

/// Prefix for quotation estimate ids.
pub const EST_ID_PREFIX: &str = "EST";

/// Prefix for receipt ids.
pub const RECEIPT_ID_PREFIX: &str = "rcp";

/// Length of the random suffix in a receipt id.
pub const RECEIPT_SUFFIX_LEN: usize = 10;

/// Generate a fresh order id from the current time.
pub fn new_order_id() -> String {
    format!("{}-{}", ORDER_ID_PREFIX, Utc::now().timestamp_millis())
}

/// Generate a fresh quotation id from the current time.
pub fn new_est_id() -> String {
    format!("{}-{}", EST_ID_PREFIX, Utc::now().timestamp_millis())
}

/// Generate a receipt id: `rcp` plus a fixed-length alphanumeric suffix.
pub fn new_receipt_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", RECEIPT_ID_PREFIX, &raw[..RECEIPT_SUFFIX_LEN])
}

/// Derive a booking order id from a quotation id by substituting the
/// prefix and keeping the numeric suffix. Returns `None` when the input
/// does not carry the expected `EST-` prefix.
pub fn derive_order_id(est_id: &str) -> Option<String> {
    let suffix = est_id.strip_prefix(EST_ID_PREFIX)?;
    if !suffix.starts_with('-') || suffix.len() < 2 {
        return None;
    }
    Some(format!("{}{}", ORDER_ID_PREFIX, suffix))
}

/// Check an id against the URL-safe alphabet accepted on wire paths.
pub fn is_url_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Strip the first prefix segment from an id (`DORD-123` -> `123`).
///
/// Historical bookings were recorded before the prefix format settled
/// down; invoice lookup falls back to this form when the primary lookup
/// misses.
pub fn strip_prefix_segment(id: &str) -> Option<String> {
    let (head, tail) = id.split_once('-')?;
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    Some(tail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_has_prefix_and_numeric_suffix() {
        let id = new_order_id();
        let suffix = id.strip_prefix("ORD-").unwrap();
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        assert!(is_url_safe_id(&id));
    }

    #[test]
    fn receipt_id_is_fixed_length() {
        let id = new_receipt_id();
        assert!(id.starts_with("rcp"));
        assert_eq!(id.len(), RECEIPT_ID_PREFIX.len() + RECEIPT_SUFFIX_LEN);
        assert!(id[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn promotion_preserves_suffix() {
        assert_eq!(
            derive_order_id("EST-1751548161837").as_deref(),
            Some("ORD-1751548161837")
        );
        assert_eq!(derive_order_id("ORD-1751548161837"), None);
        assert_eq!(derive_order_id("EST"), None);
    }

    #[test]
    fn prefix_segment_fallback() {
        assert_eq!(
            strip_prefix_segment("DORD-1751548161837").as_deref(),
            Some("1751548161837")
        );
        assert_eq!(
            strip_prefix_segment("ORD-2024-17").as_deref(),
            Some("2024-17")
        );
        assert_eq!(strip_prefix_segment("noprefix"), None);
    }
}
