//! Numbering-token formatter for `xsl:number`.
//!
//! A format string splits into alternating alphanumeric tokens and separator
//! tokens: `"(1.a)"` has prefix `(`, tokens `1` and `a` joined by `.`, and
//! suffix `)`. When there are more numbers than tokens the tokens are reused
//! from the start, joined by the separator at the matching position or `.`.

use smallvec::SmallVec;

use crate::error::Result;
use crate::sort::primary_subtag;

const DEFAULT_SEPARATOR: &str = ".";

// zeros of the decimal digit families a token may use
const DIGIT_ZEROS: &[char] = &[
    '0', '\u{0660}', '\u{06F0}', '\u{0966}', '\u{09E6}', '\u{0A66}', '\u{0AE6}', '\u{0E50}', '\u{FF10}',
];

const GREEK_LOWER: &[char] = &[
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ', 'τ', 'υ', 'φ', 'χ',
    'ψ', 'ω',
];
const GREEK_UPPER: &[char] = &[
    'Α', 'Β', 'Γ', 'Δ', 'Ε', 'Ζ', 'Η', 'Θ', 'Ι', 'Κ', 'Λ', 'Μ', 'Ν', 'Ξ', 'Ο', 'Π', 'Ρ', 'Σ', 'Τ', 'Υ', 'Φ', 'Χ',
    'Ψ', 'Ω',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LetterValue {
    /// `i`/`I` are roman numerals.
    #[default]
    Traditional,
    /// `i`/`I` are letters of an alphabetic sequence.
    Alphabetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSettings {
    pub format: String,
    pub lang: Option<String>,
    pub letter_value: LetterValue,
    pub grouping_separator: Option<char>,
    pub grouping_size: usize,
}

impl Default for NumberSettings {
    fn default() -> Self {
        Self::new("1")
    }
}

impl NumberSettings {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            lang: None,
            letter_value: LetterValue::Traditional,
            grouping_separator: None,
            grouping_size: 0,
        }
    }

    /// Fails on a malformed language tag.
    pub fn with_lang(mut self, tag: &str) -> Result<Self> {
        primary_subtag(tag)?;
        self.lang = Some(tag.to_string());
        Ok(self)
    }

    #[must_use]
    pub fn with_letter_value(mut self, letter_value: LetterValue) -> Self {
        self.letter_value = letter_value;
        self
    }

    #[must_use]
    pub fn with_grouping(mut self, separator: char, size: usize) -> Self {
        self.grouping_separator = Some(separator);
        self.grouping_size = size;
        self
    }

    fn is_greek(&self) -> bool {
        self.lang.as_deref().and_then(|l| primary_subtag(l).ok()).is_some_and(|p| p == "el")
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Tokens<'a> {
    prefix: &'a str,
    tokens: SmallVec<[&'a str; 4]>,
    separators: SmallVec<[&'a str; 4]>,
    suffix: &'a str,
}

fn tokenize(format: &str) -> Tokens<'_> {
    let mut out = Tokens::default();
    let mut runs: Vec<(bool, &str)> = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (i, c) in format.char_indices() {
        let alnum = c.is_alphanumeric();
        if current.is_some_and(|k| k != alnum) {
            runs.push((!alnum, &format[start..i]));
            start = i;
        }
        current = Some(alnum);
    }
    if let Some(k) = current {
        runs.push((k, &format[start..]));
    }
    let mut iter = runs.into_iter().peekable();
    if let Some((false, s)) = iter.peek().copied() {
        out.prefix = s;
        iter.next();
    }
    let mut pending_sep: Option<&str> = None;
    for (alnum, s) in iter {
        if alnum {
            if let Some(sep) = pending_sep.take() {
                out.separators.push(sep);
            }
            out.tokens.push(s);
        } else {
            pending_sep = Some(s);
        }
    }
    out.suffix = pending_sep.unwrap_or_default();
    out
}

fn digit_family(token: &str) -> Option<char> {
    let last = token.chars().last()?;
    let zero = DIGIT_ZEROS.iter().copied().find(|z| (*z as u32) + 1 == last as u32)?;
    let in_family = |c: char| (zero as u32..=zero as u32 + 9).contains(&(c as u32));
    token.chars().all(in_family).then_some(zero)
}

fn decimal(n: u64, zero: char, width: usize, settings: &NumberSettings) -> String {
    let digits: Vec<char> = n
        .to_string()
        .bytes()
        .map(|b| char::from_u32(zero as u32 + u32::from(b - b'0')).unwrap_or(zero))
        .collect();
    let mut padded: Vec<char> = std::iter::repeat_n(zero, width.saturating_sub(digits.len())).collect();
    padded.extend(digits);
    match settings.grouping_separator {
        Some(sep) if settings.grouping_size > 0 => {
            let size = settings.grouping_size;
            let len = padded.len();
            let mut out = String::with_capacity(len + len / size);
            for (i, c) in padded.into_iter().enumerate() {
                if i > 0 && (len - i) % size == 0 {
                    out.push(sep);
                }
                out.push(c);
            }
            out
        }
        _ => padded.into_iter().collect(),
    }
}

/// Bijective base-n: 1 → a, 26 → z, 27 → aa.
fn alphabetic(mut n: u64, alphabet: &[char]) -> String {
    let base = alphabet.len() as u64;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        let idx = usize::try_from(n % base).unwrap_or_default();
        out.push(alphabet[idx]);
        n /= base;
    }
    out.iter().rev().collect()
}

fn latin(upper: bool) -> Vec<char> {
    if upper { ('A'..='Z').collect() } else { ('a'..='z').collect() }
}

fn roman(mut n: u64, upper: bool) -> String {
    const TABLE: &[(u64, &str)] = &[
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= *value {
            out.push_str(digits);
            n -= value;
        }
    }
    if upper { out.to_uppercase() } else { out }
}

fn format_one(n: u64, token: &str, settings: &NumberSettings) -> String {
    if let Some(zero) = digit_family(token) {
        return decimal(n, zero, token.chars().count(), settings);
    }
    let mut chars = token.chars();
    let first = chars.next().unwrap_or('1');
    let single = chars.next().is_none();
    if n == 0 || !single {
        return decimal(n, '0', 1, settings);
    }
    match first {
        'i' | 'I' if settings.letter_value == LetterValue::Traditional => {
            if (1..=3999).contains(&n) { roman(n, first == 'I') } else { decimal(n, '0', 1, settings) }
        }
        'a' | 'A' | 'i' | 'I' if settings.is_greek() => {
            alphabetic(n, if first.is_uppercase() { GREEK_UPPER } else { GREEK_LOWER })
        }
        'a' | 'A' | 'i' | 'I' => alphabetic(n, &latin(first.is_uppercase())),
        'α' => alphabetic(n, GREEK_LOWER),
        'Α' => alphabetic(n, GREEK_UPPER),
        _ => decimal(n, '0', 1, settings),
    }
}

enum Value {
    Count(u64),
    Text(String),
}

fn format_all(values: &[Value], settings: &NumberSettings) -> String {
    if values.is_empty() {
        return String::new();
    }
    let parsed = tokenize(&settings.format);
    let tokens: SmallVec<[&str; 4]> = if parsed.tokens.is_empty() { SmallVec::from_slice(&["1"]) } else { parsed.tokens.clone() };
    let mut out = String::from(parsed.prefix);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            let k = (i - 1) % tokens.len();
            out.push_str(parsed.separators.get(k).copied().unwrap_or(DEFAULT_SEPARATOR));
        }
        match value {
            Value::Count(n) => out.push_str(&format_one(*n, tokens[i % tokens.len()], settings)),
            Value::Text(t) => out.push_str(t),
        }
    }
    out.push_str(parsed.suffix);
    out
}

/// Format counter results. An empty list formats as the empty string.
pub fn format_numbers(values: &[u64], settings: &NumberSettings) -> String {
    let values: Vec<Value> = values.iter().map(|n| Value::Count(*n)).collect();
    format_all(&values, settings)
}

/// Format explicit `value=` numbers. Each is rounded half up; `NaN`, the
/// infinities and anything below one are written as plain numbers in place.
pub fn format_values(values: &[f64], settings: &NumberSettings) -> String {
    let values: Vec<Value> = values.iter().map(|v| to_value(*v)).collect();
    format_all(&values, settings)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn to_value(v: f64) -> Value {
    if v.is_nan() {
        return Value::Text("NaN".into());
    }
    if v.is_infinite() {
        return Value::Text(if v > 0.0 { "Infinity" } else { "-Infinity" }.into());
    }
    let rounded = (v + 0.5).floor();
    if rounded < 1.0 {
        return Value::Text(format!("{rounded}"));
    }
    if rounded >= u64::MAX as f64 {
        return Value::Text(format!("{rounded}"));
    }
    Value::Count(rounded as u64)
}
