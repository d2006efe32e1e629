//! Capture filter: decides whether a finished generation is worth keeping warm.

use cache_refresher_types::{RefreshError, RefreshPayload};

/// Check a captured payload against the eligibility rules.
///
/// Rejected payloads leave scheduler state untouched.
pub fn check(payload: &RefreshPayload, min_tokens_floor: u32) -> Result<(), RefreshError> {
    if payload.dry_run {
        return Err(RefreshError::ineligible("dry run prompt"));
    }

    if payload.is_empty() {
        return Err(RefreshError::ineligible("no prompt found in generation data"));
    }

    let tokens = estimate_tokens_from_str(&payload.prompt_text());
    if tokens < min_tokens_floor {
        return Err(RefreshError::ineligible(format!(
            "prompt has ~{} tokens, below floor of {}",
            tokens, min_tokens_floor
        )));
    }

    Ok(())
}

/// Rough token estimate with multi-language awareness.
///
/// - ASCII: ~4 characters per token
/// - Other Unicode (CJK etc.): ~1.5 characters per token
/// - 15% margin on top for tokenizer variance
pub fn estimate_tokens_from_str(s: &str) -> u32 {
    if s.is_empty() {
        return 0;
    }

    let (ascii_chars, unicode_chars) =
        s.chars().fold((0u32, 0u32), |(ascii, other), c| {
            if c.is_ascii() {
                (ascii.saturating_add(1), other)
            } else {
                (ascii, other.saturating_add(1))
            }
        });

    let ascii_tokens = (ascii_chars as f32 / 4.0).ceil() as u32;
    let unicode_tokens = (unicode_chars as f32 / 1.5).ceil() as u32;

    (ascii_tokens.saturating_add(unicode_tokens) as f32 * 1.15).ceil() as u32
}
