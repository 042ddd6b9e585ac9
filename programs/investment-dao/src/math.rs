//! Checked arithmetic on lamport amounts and timestamps.
//!
//! Every value movement in the program goes through these helpers. They
//! never wrap: overflow, underflow and division by zero surface as
//! `DaoError`s. Proportional splits use `u128` intermediates so that
//! `a * b` cannot overflow before the division.

use crate::error::{DaoError, DaoResult};

pub fn add(a: u64, b: u64) -> DaoResult<u64> {
    a.checked_add(b).ok_or(DaoError::ArithmeticOverflow)
}

pub fn sub(a: u64, b: u64) -> DaoResult<u64> {
    a.checked_sub(b).ok_or(DaoError::ArithmeticUnderflow)
}

/// `a * b / c`, rounded down.
pub fn mul_div(a: u64, b: u64, c: u64) -> DaoResult<u64> {
    if c == 0 {
        return Err(DaoError::DivisionByZero);
    }
    let result = (a as u128) * (b as u128) / (c as u128);
    u64::try_from(result).map_err(|_| DaoError::ArithmeticOverflow)
}

/// `a * b / c`, rounded up.
pub fn mul_div_ceil(a: u64, b: u64, c: u64) -> DaoResult<u64> {
    if c == 0 {
        return Err(DaoError::DivisionByZero);
    }
    let c = c as u128;
    let result = ((a as u128) * (b as u128)).div_ceil(c);
    u64::try_from(result).map_err(|_| DaoError::ArithmeticOverflow)
}

/// Unix timestamp plus a duration in seconds.
pub fn add_seconds(timestamp: i64, seconds: i64) -> DaoResult<i64> {
    timestamp
        .checked_add(seconds)
        .ok_or(DaoError::ArithmeticOverflow)
}
