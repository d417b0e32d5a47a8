//! Private-room and video-room join codes (§4.3.2, §4.4.2).
//!
//! Alphabet `[A-Z0-9]`, length exactly 6. Generation samples uniformly
//! and retries against the store up to 10 times on collision. Lives
//! alongside the `Store` trait it depends on so both engines share one
//! implementation instead of duplicating it.

use crate::traits::Store;
use collab_types::{CollabError, ErrorCode};
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;
const MAX_ATTEMPTS: u32 = 10;

fn sample_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}

/// Generates a chat-room code, retrying on collision up to
/// [`MAX_ATTEMPTS`] times.
pub async fn generate_unique_chat_code(store: &dyn Store) -> Result<String, CollabError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = sample_code();
        let exists = store
            .chat_room_code_exists(&candidate)
            .await
            .map_err(CollabError::from)?;
        if !exists {
            return Ok(candidate);
        }
    }
    Err(CollabError::new(
        ErrorCode::CodeGenerationFailed,
        "exhausted collision retries generating a room code",
    ))
}

/// Generates a video-room code using the same alphabet/length/retry rule.
pub async fn generate_unique_video_code(store: &dyn Store) -> Result<String, CollabError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = sample_code();
        let exists = store
            .video_room_code_exists(&candidate)
            .await
            .map_err(CollabError::from)?;
        if !exists {
            return Ok(candidate);
        }
    }
    Err(CollabError::new(
        ErrorCode::CodeGenerationFailed,
        "exhausted collision retries generating a room code",
    ))
}

/// Normalizes a user-supplied code for comparison: upper-cased, accepted
/// lengths 6-8 (forward compatibility) even though issued codes are
/// always 6 (§4.3.2).
pub fn normalize_code(input: &str) -> Option<String> {
    let upper = input.trim().to_ascii_uppercase();
    if (6..=8).contains(&upper.len()) && upper.bytes().all(|b| ALPHABET.contains(&b)) {
        Some(upper)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_code_has_correct_length_and_alphabet() {
        let code = sample_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn normalize_code_upcases_and_trims() {
        assert_eq!(normalize_code(" ab12cd "), Some("AB12CD".to_string()));
    }

    #[test]
    fn normalize_code_rejects_bad_length() {
        assert_eq!(normalize_code("ABC"), None);
        assert_eq!(normalize_code("ABCDEFGHIJK"), None);
    }

    #[test]
    fn normalize_code_rejects_non_alphabet_chars() {
        assert_eq!(normalize_code("AB12-D"), None);
    }
}
