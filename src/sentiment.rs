use std::collections::HashSet;

use crate::types::ColorId;

const POSITIVE: [&str; 11] = [
    "excited",
    "curious",
    "optimistic",
    "hopeful",
    "prepared",
    "confident",
    "inspired",
    "amazed",
    "thrilled",
    "fascinated",
    "better",
];

const NEGATIVE: [&str; 10] = [
    "scared",
    "terrified",
    "worried",
    "nervous",
    "overwhelmed",
    "unprepared",
    "anxious",
    "doubtful",
    "shitty",
    "dumb",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn hex(self) -> &'static str {
        match self {
            Sentiment::Positive => "#86efac",
            Sentiment::Negative => "#fca5a5",
            Sentiment::Neutral => "#93c5fd",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Sentiment::Positive => (0x86, 0xef, 0xac),
            Sentiment::Negative => (0xfc, 0xa5, 0xa5),
            Sentiment::Neutral => (0x93, 0xc5, 0xfd),
        }
    }

    pub fn color_id(self) -> ColorId {
        match self {
            Sentiment::Positive => ColorId::Positive,
            Sentiment::Negative => ColorId::Negative,
            Sentiment::Neutral => ColorId::Neutral,
        }
    }
}

/// Fixed keyword membership classifier.
#[derive(Clone, Debug)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Lexicon {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            positive: positive.into_iter().map(Into::into).collect(),
            negative: negative.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, word: &str) -> Sentiment {
        if self.positive.contains(word) {
            Sentiment::Positive
        } else if self.negative.contains(word) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(POSITIVE, NEGATIVE)
    }
}
