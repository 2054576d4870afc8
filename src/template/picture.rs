//! Picture clause parsing and normalization.
//!
//! XFA pictures come wrapped in a category (`date{YYYY-MM-DD}`,
//! `time.short{}`, `text{A9A 9A9}`) or bare. Only date and time pictures
//! yield a format; text and numeric masks are dropped.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CATEGORY_RE: Regex =
        Regex::new(r"(?is)^\s*(datetime|date|time|text|num)(?:\.(\w+))?\s*\{(.*)\}\s*$").unwrap();
    static ref MASK_RE: Regex = Regex::new(r"[A9X#]{2,}").unwrap();
}

/// Category prefix of a picture clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureCategory {
    /// `date{...}`
    Date,
    /// `time{...}`
    Time,
    /// `datetime{...}`
    DateTime,
    /// `text{...}`
    Text,
    /// `num{...}`
    Num,
    /// No category prefix
    Bare,
}

/// A parsed picture clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// Category prefix
    pub category: PictureCategory,
    /// Pattern between the braces (or the whole clause when bare)
    pub pattern: String,
    /// Locale style such as `short` in `date.short{}`
    pub style: Option<String>,
}

impl Picture {
    /// Parse a picture clause. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let Some(caps) = CATEGORY_RE.captures(raw) else {
            return Some(Self {
                category: PictureCategory::Bare,
                pattern: raw.to_string(),
                style: None,
            });
        };

        let category = match caps[1].to_ascii_lowercase().as_str() {
            "datetime" => PictureCategory::DateTime,
            "date" => PictureCategory::Date,
            "time" => PictureCategory::Time,
            "text" => PictureCategory::Text,
            _ => PictureCategory::Num,
        };
        Some(Self {
            category,
            pattern: caps[3].trim().to_string(),
            style: caps.get(2).map(|m| m.as_str().to_ascii_lowercase()),
        })
    }

    /// Whether the pattern reads as an input mask rather than a date/time layout.
    pub fn is_mask(&self) -> bool {
        match self.category {
            PictureCategory::Text | PictureCategory::Num => true,
            PictureCategory::Bare => MASK_RE.is_match(&self.pattern),
            _ => false,
        }
    }

    /// Whether a bare pattern carries hour tokens.
    pub fn looks_like_time(&self) -> bool {
        match self.category {
            PictureCategory::Time => true,
            PictureCategory::Bare => unquoted(&self.pattern).any(|c| matches!(c, 'h' | 'H' | 'k' | 'K')),
            _ => false,
        }
    }

    /// Canonical format string, or `None` for masks and empty clauses.
    pub fn normalized(&self) -> Option<String> {
        if self.is_mask() {
            return None;
        }
        if self.pattern.is_empty() {
            return self.style.clone();
        }
        let out = match self.category {
            PictureCategory::Time => normalize_tokens(&self.pattern, time_token),
            PictureCategory::Bare if self.looks_like_time() => {
                normalize_tokens(&self.pattern, time_token)
            },
            _ => normalize_tokens(&self.pattern, date_token),
        };
        Some(out).filter(|s| !s.is_empty())
    }
}

/// Normalize a raw picture clause to its canonical date/time format.
///
/// Returns `None` for blank input and for text or numeric masks.
pub fn normalize_picture(raw: &str) -> Option<String> {
    Picture::parse(raw).and_then(|p| p.normalized())
}

fn unquoted(pattern: &str) -> impl Iterator<Item = char> + '_ {
    let mut in_quote = false;
    pattern.chars().filter(move |&c| {
        if c == '\'' {
            in_quote = !in_quote;
            return false;
        }
        !in_quote
    })
}

fn date_token(c: char) -> Option<char> {
    match c {
        'y' | 'Y' => Some('Y'),
        'm' | 'M' => Some('M'),
        'd' | 'D' => Some('D'),
        'e' | 'E' => Some('E'),
        _ => None,
    }
}

// hour letters keep their case: h/H differ in meaning
fn time_token(c: char) -> Option<char> {
    match c {
        'm' | 'M' => Some('M'),
        's' | 'S' => Some('S'),
        'f' | 'F' => Some('F'),
        'a' | 'A' => Some('A'),
        _ => None,
    }
}

fn normalize_tokens(pattern: &str, token: fn(char) -> Option<char>) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut in_quote = false;
    let mut pending_space = false;

    for c in pattern.trim().chars() {
        if c == '\'' {
            in_quote = !in_quote;
        } else if !in_quote && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if in_quote || c == '\'' {
            out.push(c);
        } else {
            out.push(token(c).unwrap_or(c));
        }
    }
    out
}
