//! Feed identity format checks
//!
//! A feed id names the author of a log, e.g.
//! `@FCX/tsDLpubCPKKfIrw4gc+SQkHcaD17s7GI6i/ziWY=.ed25519`. The compilers only
//! need a yes/no answer on the format, so the check sits behind
//! [`FeedIdValidator`] and can be swapped by the caller.

use regex::Regex;
use std::sync::LazyLock;

/// `@` sigil, 32-byte key in canonical base64, then the signature algorithm
/// suffix. The last key character carries 2 padding bits that must be zero.
static SSB_FEED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@[A-Za-z0-9/+]{42}[AEIMQUYcgkosw048]=\.(?:ed25519|sha256)$")
        .expect("feed id pattern is valid")
});

/// Feed-id format predicate
pub trait FeedIdValidator: Send + Sync {
    fn is_valid_feed_id(&self, value: &str) -> bool;
}

impl<F> FeedIdValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid_feed_id(&self, value: &str) -> bool {
        self(value)
    }
}

/// Strict SSB feed reference check
#[derive(Debug, Clone, Copy, Default)]
pub struct SsbFeedIdValidator;

impl FeedIdValidator for SsbFeedIdValidator {
    fn is_valid_feed_id(&self, value: &str) -> bool {
        SSB_FEED_ID.is_match(value)
    }
}

/// Accepts anything carrying the `@` feed sigil followed by a key
#[derive(Debug, Clone, Copy, Default)]
pub struct SigilFeedIdValidator;

impl FeedIdValidator for SigilFeedIdValidator {
    fn is_valid_feed_id(&self, value: &str) -> bool {
        value.len() > 1 && value.starts_with('@')
    }
}
