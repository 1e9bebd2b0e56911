//! JSON decoding with required-field validation for webhook bodies.

use serde::de::DeserializeOwned;

use super::error::{ChannelError, Result};

/// Required-field checks that serde alone cannot express (non-zero ids, non-empty handles).
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Decode `body` as JSON into `T` and run its validation.
pub fn decode_and_validate<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(body)
        .map_err(|e| ChannelError::validation(format!("unable to parse request JSON: {}", e)))?;
    value.validate()?;
    Ok(value)
}

/// Fail with a validation error naming `field` when `value` is empty.
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChannelError::validation(format!("field '{}' is required", field)));
    }
    Ok(())
}
