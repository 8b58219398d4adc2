use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

const STOPLIST: [&str; 12] = [
    "the", "and", "a", "an", "of", "in", "on", "to", "for", "with", "is", "are",
];

const BLOCKLIST: [&str; 6] = ["fuck", "shit", "bitch", "asshole", "cunt", "dick"];

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\-]").expect("static character class"));

static STEMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("excite", "excited"),
        ("exciting", "excited"),
        ("excitement", "excited"),
        ("scare", "scared"),
        ("terrify", "terrified"),
        ("worry", "worried"),
        ("prepare", "prepared"),
        ("un-?prepare(d)?", "unprepared"),
    ]
    .into_iter()
    .map(|(pattern, stem)| {
        let re = Regex::new(&format!("^{pattern}$")).expect("static stem pattern");
        (re, stem)
    })
    .collect()
});

/// Lowercases, strips everything but letters and hyphens, and folds known
/// variants onto their stem. Returns `None` for empty or stoplisted input.
pub fn normalize(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let stripped = DISALLOWED.replace_all(lowered.trim(), "");
    if stripped.is_empty() || STOPLIST.contains(&&*stripped) {
        return None;
    }
    let stem = STEMS
        .iter()
        .find(|(re, _)| re.is_match(&stripped))
        .map(|(_, stem)| *stem);
    Some(stem.map_or_else(|| stripped.into_owned(), str::to_string))
}

pub fn is_allowed(word: &str) -> bool {
    !word.is_empty() && !BLOCKLIST.contains(&word)
}

/// Full submission gate: normalize, then reject blocked words.
pub fn check(raw: &str) -> Result<String> {
    let word = normalize(raw).ok_or(Error::InvalidWord)?;
    if !is_allowed(&word) {
        return Err(Error::BlockedWord);
    }
    Ok(word)
}

/// Free-text partition key for submissions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Room(String);

impl Room {
    pub const DEFAULT: &'static str = "default";

    pub fn parse(raw: &str) -> Self {
        let room = raw.trim().to_lowercase();
        if room.is_empty() {
            Room(Self::DEFAULT.to_string())
        } else {
            Room(room)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for Room {
    fn default() -> Self {
        Room(Self::DEFAULT.to_string())
    }
}
