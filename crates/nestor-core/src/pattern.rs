//! Addressed-pattern construction.
//!
//! `respond` listeners only fire when a message is directed at the bot. Rather
//! than special-casing matching, the caller's pattern is rewritten so that it
//! additionally requires one of the addressed prefixes:
//!
//! ```text
//! <bot_id>[:,]? <content>            e.g. "nestor: deploy"
//! <@<bot_id>|<display>>: <content>   e.g. "<@U42|nestor>: deploy"
//! ```
//!
//! The prefix groups are non-capturing, so group `1` of the rewritten pattern
//! is group `1` of the caller's pattern.
//!
//! Neither the separator nor the following whitespace is required, so the
//! bot id acts as a plain prefix: with bot `nestor`, `"nestorious ping"` is
//! addressed and the caller's pattern sees `"ious ping"`. The caller's pattern
//! must match right after the prefix, so one starting with literal text such
//! as `ping` rejects it.

use regex::Regex;

/// Builds the addressed source string for `pattern` without compiling it.
pub fn addressed_source(pattern: &str, bot_id: &str) -> String {
    let bot = regex::escape(bot_id);
    format!(r"^\s*(?:{bot}[:,]?|<@{bot}\|[^>]*>:)\s*(?:{pattern})")
}

/// Rewrites `pattern` so it only matches text addressed to `bot_id`.
///
/// The bot identifier is escaped before interpolation; it is data, never
/// pattern syntax.
///
/// # Example
///
/// ```rust
/// use nestor_core::respond_pattern;
///
/// let re = respond_pattern("(.*)", "nestor").unwrap();
/// let caps = re.captures("nestor message").unwrap();
/// assert_eq!(&caps[1], "message");
/// assert!(!re.is_match("message"));
/// ```
pub fn respond_pattern(pattern: &str, bot_id: &str) -> Result<Regex, regex::Error> {
    Regex::new(&addressed_source(pattern, bot_id))
}
