//! Prefix classification and identifier pattern rules

use regex::Regex;
use std::sync::OnceLock;

/// Classifier that derives a grouping key from a raw identifier using
/// two extraction rules with configurable precedence.
pub struct PrefixClassifier {
    generic: Regex,
    w_pattern: Regex,
    use_w_pattern_first: bool,
}

impl PrefixClassifier {
    pub fn new(use_w_pattern_first: bool) -> Self {
        // Greedy `.+` makes the capture run through the rightmost
        // uppercase-letter-then-digit boundary.
        let generic = Regex::new(r"^(.+[A-Z])[0-9]").unwrap();
        let w_pattern =
            Regex::new(r"^([A-Z0-9]{3}[0-9]{5}[A-Z][0-9]{2}W[0-9]{2}[^0-9])").unwrap();
        Self {
            generic,
            w_pattern,
            use_w_pattern_first,
        }
    }

    /// Generic rule: everything through the rightmost uppercase letter
    /// that is immediately followed by a digit, or the whole trimmed
    /// string when no such boundary exists. Never empty for non-blank
    /// input.
    pub fn generic_prefix(&self, raw: &str) -> String {
        let t = raw.trim().to_uppercase();
        if t.is_empty() {
            return String::new();
        }
        match self.generic.captures(&t) {
            Some(caps) => caps[1].to_string(),
            None => t,
        }
    }

    /// W-pattern rule: fixed-shape match (3 alphanumerics, 5 digits,
    /// letter, 2 digits, 'W', 2 digits, one non-digit). Empty when the
    /// shape does not match.
    pub fn w_pattern_prefix(&self, raw: &str) -> String {
        let t = raw.trim().to_uppercase();
        match self.w_pattern.captures(&t) {
            Some(caps) => caps[1].to_string(),
            None => String::new(),
        }
    }

    /// Apply the preferred rule and fall back to the other one when it
    /// yields nothing. With generic precedence the W-pattern fallback
    /// is unreachable (the generic rule never returns empty); this is
    /// long-standing behavior kept on purpose.
    pub fn group_key(&self, raw: &str) -> String {
        if self.use_w_pattern_first {
            let p = self.w_pattern_prefix(raw);
            if p.is_empty() {
                self.generic_prefix(raw)
            } else {
                p
            }
        } else {
            let p = self.generic_prefix(raw);
            if p.is_empty() {
                self.w_pattern_prefix(raw)
            } else {
                p
            }
        }
    }
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap())
}

fn safe_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-.]+$").unwrap())
}

fn filename_to_preform() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z0-9]{3}[0-9]{5}).*?([A-Z])$").unwrap())
}

fn zero_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+\-]?\s*0+(?:[.,]0+)?\s*$").unwrap())
}

/// Sanitize a grouping key into a usable file name. Collisions after
/// sanitization are not resolved; the last write wins.
pub fn safe_filename(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "EMPTY".to_string();
    }
    unsafe_chars().replace_all(trimmed, "_").into_owned()
}

/// True when the value only contains alphanumerics, dot, dash or
/// underscore (usable as a folder name as-is).
pub fn is_safe_name(name: &str) -> bool {
    safe_name().is_match(name)
}

/// Re-derive a preform identifier from a file stem: an 8-character
/// alphanumeric base plus the trailing uppercase letter. `None` when
/// the stem does not match.
pub fn preform_from_filename(stem: &str) -> Option<String> {
    let upper = stem.trim().to_uppercase();
    filename_to_preform()
        .captures(&upper)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
}

/// True for string renditions of zero: "0", "0.0", "-0,00", " +0 "...
/// or any text that parses to exactly zero after comma-to-dot repair.
pub fn is_zero_like(text: &str) -> bool {
    if zero_like().is_match(text.trim()) {
        return true;
    }
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(|v| v == 0.0)
        .unwrap_or(false)
}
