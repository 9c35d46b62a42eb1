//! Result normalization.
//!
//! Turns a named result map into a bit-vector aligned to the catalog order.

use crate::{ClassifierError, SuiteResult};

/// One bit per catalog check: 1 = pass, 0 = fail
pub type BitVector = Vec<u8>;

/// Emit the bit for each check in `ordered_checks`, in that order.
///
/// Checks the suite reported but the catalog does not know are ignored. A
/// catalog check without a result means the catalog and the run diverged.
pub fn normalize(result: &SuiteResult, ordered_checks: &[String]) -> Result<BitVector, ClassifierError> {
    ordered_checks
        .iter()
        .map(|check| {
            result
                .get(check)
                .map(|r| u8::from(r.success))
                .ok_or_else(|| ClassifierError::MissingCheckResult {
                    check: check.clone(),
                })
        })
        .collect()
}

/// Render a bit-vector as a compact "0101" string
pub fn bits_to_string(bits: &[u8]) -> String {
    bits.iter().map(|b| if *b == 0 { '0' } else { '1' }).collect()
}
