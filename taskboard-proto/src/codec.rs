//! Text encoding of persisted board state.
//!
//! Both the list snapshot and the current-user record are stored as JSON
//! strings. Decoding never panics on arbitrary input; malformed data comes
//! back as [`CodecError::Malformed`].

use crate::board::TaskList;
use crate::user::UserProfile;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The stored text is not a valid encoding of the expected value.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Encodes a user's list sequence.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the lists cannot be serialized.
pub fn encode_lists(lists: &[TaskList]) -> Result<String, CodecError> {
    serde_json::to_string(lists).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a user's list sequence.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if the text is not a JSON array of lists.
pub fn decode_lists(text: &str) -> Result<Vec<TaskList>, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encodes the current-user record.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the profile cannot be serialized.
pub fn encode_profile(profile: &UserProfile) -> Result<String, CodecError> {
    serde_json::to_string(profile).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes the current-user record.
///
/// A record whose email is blank is rejected, since it cannot scope any
/// storage key.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if the text is not a valid profile.
pub fn decode_profile(text: &str) -> Result<UserProfile, CodecError> {
    let profile: UserProfile =
        serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))?;
    if profile.email.trim().is_empty() {
        return Err(CodecError::Malformed("missing email".to_string()));
    }
    Ok(profile)
}
