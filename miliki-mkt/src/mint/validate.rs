//! Mint form validation
//!
//! All fields are checked locally and every failure is reported at once,
//! keyed by field name. Validation runs before any credential lookup or
//! network call.

use crate::error::{FieldErrors, Result};
use crate::storage::UploadFile;

pub const MAX_COPIES: i64 = 10_000;

/// A mint submission before validation
#[derive(Debug, Clone)]
pub struct MintDraft {
    pub artist_name: String,
    pub song_title: String,
    pub song_writer: String,
    pub producer: String,
    pub available_copies: i64,
    pub audio_file: UploadFile,
    pub cover_art: UploadFile,
}

/// Validate every field, collecting all failures
pub fn validate(draft: &MintDraft) -> Result<()> {
    let mut errors = FieldErrors::new();

    if draft.artist_name.trim().is_empty() {
        errors.push("artist_name", "Artist name is required");
    }
    if draft.song_title.trim().is_empty() {
        errors.push("song_title", "Song title is required");
    }
    if draft.song_writer.trim().is_empty() {
        errors.push("song_writer", "Songwriter is required");
    }
    if draft.producer.trim().is_empty() {
        errors.push("producer", "Producer name is required");
    }

    if draft.available_copies < 1 {
        errors.push("available_copies", "Must mint at least 1 copy");
    } else if draft.available_copies > MAX_COPIES {
        errors.push("available_copies", "Maximum 10,000 copies allowed");
    }

    if !draft.audio_file.content_type.starts_with("audio/") {
        errors.push("audio_file", "Must be an audio file");
    }
    if !draft.cover_art.content_type.starts_with("image/") {
        errors.push("cover_art", "Must be an image file");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn file(name: &str, content_type: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data: vec![0u8; 4],
        }
    }

    fn valid_draft() -> MintDraft {
        MintDraft {
            artist_name: "Miriam".to_string(),
            song_title: "Pata Pata".to_string(),
            song_writer: "M. Makeba".to_string(),
            producer: "J. Levine".to_string(),
            available_copies: 100,
            audio_file: file("song.mp3", "audio/mpeg"),
            cover_art: file("cover.png", "image/png"),
        }
    }

    fn messages_for(result: Result<()>, field: &str) -> Vec<String> {
        match result.unwrap_err() {
            Error::Validation(errors) => errors
                .errors
                .into_iter()
                .filter(|e| e.field == field)
                .map(|e| e.message)
                .collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate(&valid_draft()).is_ok());
    }

    #[test]
    fn blank_text_fields_are_each_reported() {
        let draft = MintDraft {
            artist_name: "  ".to_string(),
            song_title: String::new(),
            song_writer: String::new(),
            producer: String::new(),
            ..valid_draft()
        };

        match validate(&draft).unwrap_err() {
            Error::Validation(errors) => {
                let fields: Vec<&str> =
                    errors.errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["artist_name", "song_title", "song_writer", "producer"]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn copies_must_be_at_least_one() {
        let draft = MintDraft {
            available_copies: 0,
            ..valid_draft()
        };
        assert_eq!(
            messages_for(validate(&draft), "available_copies"),
            vec!["Must mint at least 1 copy"]
        );
    }

    #[test]
    fn copies_are_capped() {
        let draft = MintDraft {
            available_copies: MAX_COPIES + 1,
            ..valid_draft()
        };
        assert_eq!(
            messages_for(validate(&draft), "available_copies"),
            vec!["Maximum 10,000 copies allowed"]
        );
    }

    #[test]
    fn copies_at_the_cap_pass() {
        let draft = MintDraft {
            available_copies: MAX_COPIES,
            ..valid_draft()
        };
        assert!(validate(&draft).is_ok());
    }

    #[test]
    fn wrong_file_types_are_rejected() {
        let draft = MintDraft {
            audio_file: file("song.txt", "text/plain"),
            cover_art: file("cover.pdf", "application/pdf"),
            ..valid_draft()
        };
        assert_eq!(
            messages_for(validate(&draft), "audio_file"),
            vec!["Must be an audio file"]
        );
        let draft2 = MintDraft {
            cover_art: file("cover.pdf", "application/pdf"),
            ..valid_draft()
        };
        assert_eq!(
            messages_for(validate(&draft2), "cover_art"),
            vec!["Must be an image file"]
        );
    }
}
