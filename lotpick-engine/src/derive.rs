use crate::error::{EngineError, Result};

/// 1-based position of an ASCII letter in a..z, case-insensitive. Anything else is worth 0.
pub fn letter_value(c: char) -> u64 {
    if c.is_ascii_alphabetic() {
        (c.to_ascii_lowercase() as u8 - b'a' + 1) as u64
    } else {
        0
    }
}

pub fn string_value(s: &str) -> u64 {
    s.chars().map(letter_value).sum()
}

/// Sum of [`string_value`] over every generation string.
pub fn strings_value<S: AsRef<str>>(strings: &[S]) -> u128 {
    strings
        .iter()
        .map(|s| {
            let value = string_value(s.as_ref());
            log::debug!("Total for {:?}: {}", s.as_ref(), value);
            value as u128
        })
        .sum()
}

pub fn prior_sum(prior_numbers: &[i64]) -> Result<u128> {
    prior_numbers.iter().try_fold(0u128, |acc, &n| {
        if n < 0 {
            return Err(EngineError::invalid(format!("prior number is negative ({n})")));
        }
        Ok(acc.saturating_add(n as u128))
    })
}

/// Number of simulated draws for a run: string value + prior sum + bias.
///
/// Computed in `u128`; the ceiling check happens in the orchestrator so that an
/// oversized total is reported as such and never truncated.
pub fn iteration_total<S: AsRef<str>>(strings: &[S], prior_numbers: &[i64], bias: i64) -> Result<u128> {
    if bias < 0 {
        return Err(EngineError::invalid(format!("bias is negative ({bias})")));
    }
    let text = strings_value(strings);
    let prior = prior_sum(prior_numbers)?;
    Ok(text.saturating_add(prior).saturating_add(bias as u128))
}
