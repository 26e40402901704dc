//! Heuristic contact-field extraction.
//!
//! When a form carries no explicit mapping (or a wrong one), the engine still
//! has to find the submitter's name, email, and phone somewhere in the
//! payload. This module does that with scoring over the raw submission.
//!
//! Phone extraction is the interesting part. Every string-valued entry
//! becomes a [`Candidate`] with a precomputed trait mask, candidates that
//! look like dates are disqualified outright, and the survivors are scored
//! against [`SCORE_RULES`], a table of (predicate, weight) pairs. The policy
//! is data: each heuristic is one row, testable on its own, and the highest
//! total wins with ties going to the earliest entry in the payload.
//!
//! Date-likeness is deliberately aggressive here. A form that collects an
//! event date and a contact number side by side must never ship the date as
//! the phone, so anything shaped or parseable as a calendar date is out.

use crate::schema::SubmissionData;
use crate::value::digit_count;
use chrono::NaiveDate;
use tracing::debug;

/// Contact values recovered from a raw submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

bitflags::bitflags! {
    /// Phone-shaped traits of a candidate value, computed once per entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct ValueTraits: u8 {
        /// Contains `(` or `)`.
        const PARENS  = 1 << 0;
        /// Contains `+`.
        const PLUS    = 1 << 1;
        /// Matches a 3-3-4 digit grouping.
        const GROUPED = 1 << 2;
        /// Seven or more characters, all from the phone charset.
        const CHARSET = 1 << 3;
    }
}

/// One submission entry under consideration as a phone number.
pub(crate) struct Candidate<'a> {
    key: String,
    value: &'a str,
    traits: ValueTraits,
    digits: usize,
}

impl<'a> Candidate<'a> {
    pub(crate) fn new(key: &str, value: &'a str) -> Self {
        Self {
            key: key.to_lowercase(),
            value,
            traits: value_traits(value),
            digits: digit_count(value),
        }
    }

    /// Keys that name dates or times never hold phones, and neither do
    /// date-shaped values whatever their key says.
    fn disqualified(&self) -> bool {
        const DATE_KEY_HINTS: &[&str] = &["date", "time", "year", "month", "day"];
        DATE_KEY_HINTS.iter().any(|hint| self.key.contains(hint)) || looks_like_date(self.value)
    }

    fn score(&self) -> i32 {
        SCORE_RULES.iter().filter(|rule| (rule.applies)(self)).map(|rule| rule.weight).sum()
    }
}

struct ScoreRule {
    #[allow(dead_code)]
    name: &'static str,
    weight: i32,
    applies: fn(&Candidate) -> bool,
}

/// The phone scoring policy. Key hints score what the form author called the
/// field; value traits score what the submitter typed; digit counts score
/// plausible phone lengths. Weights are additive.
static SCORE_RULES: &[ScoreRule] = &[
    ScoreRule { name: "key mentions phone", weight: 50, applies: key_mentions_phone },
    ScoreRule { name: "key mentions mobile or cell", weight: 40, applies: key_mentions_mobile },
    ScoreRule { name: "key mentions tel", weight: 30, applies: key_mentions_tel },
    ScoreRule { name: "key mentions contact", weight: 20, applies: key_mentions_contact },
    ScoreRule { name: "value has parentheses", weight: 30, applies: has_parens },
    ScoreRule { name: "value has a plus", weight: 25, applies: has_plus },
    ScoreRule { name: "value groups digits 3-3-4", weight: 35, applies: has_grouped_digits },
    ScoreRule { name: "value stays in phone charset", weight: 20, applies: has_phone_charset },
    ScoreRule { name: "ten or more digits", weight: 15, applies: has_ten_digits },
    ScoreRule { name: "one to fifteen digits", weight: 10, applies: has_plausible_digits },
];

fn key_mentions_phone(c: &Candidate) -> bool {
    c.key.contains("phone")
}

fn key_mentions_mobile(c: &Candidate) -> bool {
    c.key.contains("mobile") || c.key.contains("cell")
}

fn key_mentions_tel(c: &Candidate) -> bool {
    c.key.contains("tel")
}

fn key_mentions_contact(c: &Candidate) -> bool {
    c.key.contains("contact")
}

fn has_parens(c: &Candidate) -> bool {
    c.traits.contains(ValueTraits::PARENS)
}

fn has_plus(c: &Candidate) -> bool {
    c.traits.contains(ValueTraits::PLUS)
}

fn has_grouped_digits(c: &Candidate) -> bool {
    c.traits.contains(ValueTraits::GROUPED)
}

fn has_phone_charset(c: &Candidate) -> bool {
    c.traits.contains(ValueTraits::CHARSET)
}

fn has_ten_digits(c: &Candidate) -> bool {
    c.digits >= 10
}

fn has_plausible_digits(c: &Candidate) -> bool {
    (1..=15).contains(&c.digits)
}

pub(crate) fn value_traits(value: &str) -> ValueTraits {
    let mut traits = ValueTraits::empty();
    if value.contains('(') || value.contains(')') {
        traits |= ValueTraits::PARENS;
    }
    if value.contains('+') {
        traits |= ValueTraits::PLUS;
    }
    if regex!(r"\d{3}[\s-]?\d{3}[\s-]?\d{4}").is_match(value) {
        traits |= ValueTraits::GROUPED;
    }
    if regex!(r"^[\d\s+\-()]{7,}$").is_match(value) {
        traits |= ValueTraits::CHARSET;
    }
    traits
}

/// True when `value` reads as a calendar date: ISO, separator-grouped,
/// a bare year, a 2020s/2030s year mention, or a spelled-out month date
/// chrono can parse.
pub(crate) fn looks_like_date(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    if regex!(r"^\d{4}-\d{2}-\d{2}").is_match(value)
        || regex!(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}$").is_match(value)
        || regex!(r"^(19|20)\d{2}$").is_match(value)
        || regex!(r"\b20[23]\d\b").is_match(value)
    {
        return true;
    }

    const SPELLED_FORMATS: &[&str] = &["%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y"];
    SPELLED_FORMATS.iter().any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

/// Find the most phone-looking value in the submission.
///
/// Returns `None` when nothing scores above zero. Ties keep the earliest
/// entry in payload order.
pub fn find_phone(data: &SubmissionData) -> Option<String> {
    let mut best: Option<(i32, &str)> = None;

    for (key, value) in data {
        let Some(text) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let candidate = Candidate::new(key, text);
        if candidate.disqualified() {
            continue;
        }
        let score = candidate.score();
        if score <= 0 {
            continue;
        }
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, text));
        }
    }

    best.map(|(score, text)| {
        debug!(score, value = text, "phone candidate selected");
        text.to_string()
    })
}

/// Settle the final phone value between an explicitly mapped one and the
/// scored search.
///
/// The scored search always wins when it finds anything. The explicit value
/// only stands when the search comes up empty, and even then it is dropped
/// if it reads as a date, or is short with nothing phone-like about it.
pub(crate) fn reconcile_phone(explicit: Option<&str>, data: &SubmissionData) -> Option<String> {
    if let Some(found) = find_phone(data) {
        return Some(found);
    }

    let explicit = explicit.map(str::trim).filter(|s| !s.is_empty())?;
    if looks_like_date(explicit) {
        debug!(value = explicit, "mapped phone rejected as date-like");
        return None;
    }
    if explicit.len() < 10 && value_traits(explicit).is_empty() {
        debug!(value = explicit, "mapped phone rejected as implausible");
        return None;
    }
    Some(explicit.to_string())
}

/// Recover name, email, and phone from a raw submission.
///
/// Name keys are matched on their normalized form (lowercased, punctuation
/// stripped), so `first_name`, `firstName`, and `First Name` all count. An
/// explicit first/last pair beats a combined name field; a lone part stands
/// in as the whole name.
pub fn extract_contact_fields(data: &SubmissionData) -> ContactFields {
    let mut first: Option<String> = None;
    let mut last: Option<String> = None;
    let mut full: Option<String> = None;
    let mut email: Option<String> = None;

    for (key, value) in data {
        let Some(text) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let norm = normalize_key(key);

        if email.is_none() && norm.contains("email") && text.contains('@') {
            email = Some(text.to_string());
        }

        if first.is_none() && norm.contains("first") && norm.contains("name") {
            first = Some(text.to_string());
        } else if last.is_none() && norm.contains("last") && norm.contains("name") {
            last = Some(text.to_string());
        } else if full.is_none() && (norm == "name" || (norm.contains("full") && norm.contains("name"))) {
            full = Some(text.to_string());
        }
    }

    if email.is_none() {
        email = data.iter().find_map(|(_, value)| {
            value
                .as_str()
                .map(str::trim)
                .filter(|s| regex!(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(s))
                .map(str::to_string)
        });
    }

    let name = match (first, last) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (first, last) => full.or(first).or(last),
    };

    ContactFields { name, email, phone: find_phone(data) }
}

fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase()
}
