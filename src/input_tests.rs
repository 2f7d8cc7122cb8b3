#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use crate::models::MAX_AMOUNT;

use super::*;

#[test]
fn test_parse_amount_plain() {
    assert_eq!(parse_amount("42.50").unwrap(), dec!(42.5));
    assert_eq!(parse_amount(" 3000 ").unwrap(), dec!(3000));
}

#[test]
fn test_parse_amount_with_symbol_and_grouping() {
    assert_eq!(parse_amount("₹1,23,456.78").unwrap(), dec!(123456.78));
}

#[test]
fn test_parse_amount_zero_is_allowed() {
    assert_eq!(parse_amount("0").unwrap(), dec!(0));
}

#[test]
fn test_parse_amount_rejects_bad_input() {
    assert!(parse_amount("").is_err());
    assert!(parse_amount("abc").is_err());
    assert!(parse_amount("-5").is_err());
    assert!(parse_amount("12.3.4").is_err());
}

#[test]
fn test_parse_amount_upper_bound() {
    assert_eq!(parse_amount("1000000000000000").unwrap(), MAX_AMOUNT);
    assert!(parse_amount("1000000000000000.01").is_err());
    assert!(parse_amount("50000000000000000000000000000").is_err());
    assert!(parse_amount("79228162514264337593543950335").is_err());
}

#[test]
fn test_validate_date() {
    assert_eq!(validate_date("2024-02-29").unwrap(), "2024-02-29");
    assert!(validate_date("2023-02-29").is_err());
    assert!(validate_date("2024/01/01").is_err());
    assert!(validate_date("yesterday").is_err());
}

#[test]
fn test_validate_month() {
    assert_eq!(validate_month("2024-05").unwrap(), "2024-05");
    assert!(validate_month("2024-13").is_err());
    assert_eq!(validate_month("2024-5").unwrap(), "2024-05");
    assert!(validate_month("May 2024").is_err());
}

#[test]
fn test_unpadded_dates_are_normalized() {
    let date = validate_date("2024-3-05").unwrap();
    assert_eq!(date, "2024-03-05");
    assert!(crate::engine::in_month(&date, "2024-03"));
    assert_eq!(validate_date(" 2024-3-5 ").unwrap(), "2024-03-05");
}

#[test]
fn test_shift_month() {
    assert_eq!(shift_month("2024-01", -1).unwrap(), "2023-12");
    assert_eq!(shift_month("2024-12", 1).unwrap(), "2025-01");
    assert_eq!(shift_month("2024-05", 0).unwrap(), "2024-05");
    assert!(shift_month("bad", 1).is_err());
}

#[test]
fn test_today_string_is_valid_date() {
    let today = today_string();
    assert!(validate_date(&today).is_ok());
}
