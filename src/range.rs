//! Range grammar: length and value constraints shared by field formats,
//! data formats (allowed characters), and checks.
//!
//! A range description is a comma separated list of items, each either a
//! single value (`"5"`), a bounded interval (`"1...40"`), or a half-open
//! interval (`"...40"` / `"1..."`). An empty description accepts any value.
//! Atoms can be decimal numbers, hex numbers (`0x1a`), single-character
//! literals (`'A'`), or symbolic names (`cr`, `lf`, `tab`, `vt`, `ff`).

use std::fmt;

use rust_decimal::Decimal;

use crate::error::{CutplaceError, Location};

const ELLIPSIS: char = '\u{2026}';

fn symbolic_code(name: &str) -> Option<i64> {
    match name.to_ascii_lowercase().as_str() {
        "cr" => Some(13),
        "ff" => Some(12),
        "lf" => Some(10),
        "tab" => Some(9),
        "vt" => Some(11),
        _ => None,
    }
}

/// One `(lower, upper)` interval; either bound may be open (`None`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeItem {
    pub lower: Option<Decimal>,
    pub upper: Option<Decimal>,
}

impl RangeItem {
    fn contains(&self, value: Decimal) -> bool {
        match (self.lower, self.upper) {
            (None, None) => true,
            (None, Some(upper)) => value <= upper,
            (Some(lower), None) => value >= lower,
            (Some(lower), Some(upper)) => value >= lower && value <= upper,
        }
    }

    fn overlaps(&self, other: &RangeItem) -> bool {
        self.contains_optional(other.lower) || self.contains_optional(other.upper)
    }

    fn contains_optional(&self, value: Option<Decimal>) -> bool {
        match value {
            Some(value) => self.contains(value),
            None => matches!((self.lower, self.upper), (None, None)),
        }
    }
}

impl fmt::Display for RangeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (None, Some(upper)) => write!(f, ":{}", upper),
            (Some(lower), None) => write!(f, "{}:", lower),
            (Some(lower), Some(upper)) if lower == upper => write!(f, "{}", lower),
            (Some(lower), Some(upper)) => write!(f, "{}:{}", lower, upper),
            (None, None) => write!(f, ""),
        }
    }
}

/// A sealed, non-overlapping set of closed intervals parsed from a range
/// description. `None` (empty description, no default) accepts anything.
#[derive(Clone, Debug, Default)]
pub struct Range {
    description: Option<String>,
    items: Vec<RangeItem>,
    lower_limit: Option<Decimal>,
    upper_limit: Option<Decimal>,
}

impl Range {
    /// An unrestricted range accepting any value.
    pub fn unbounded() -> Self {
        Range::default()
    }

    /// Parses `description`, falling back to `default` if `description` is
    /// `None` or blank.
    pub fn with_default(description: Option<&str>, default: Option<&str>) -> crate::error::Result<Self> {
        let normalized = description.map(normalize_ellipsis);
        let has_description = normalized.as_deref().map(|text| !text.trim().is_empty()).unwrap_or(false);
        let text = if has_description {
            normalized.unwrap()
        } else if let Some(default) = default {
            default.to_string()
        } else {
            return Ok(Range::unbounded());
        };
        Range::parse(&text)
    }

    /// Parses a range description with no default.
    pub fn parse(description: &str) -> crate::error::Result<Self> {
        if description.trim().is_empty() {
            return Ok(Range::unbounded());
        }
        let tokens = tokenize(description)?;
        let mut items = Vec::new();
        for group in tokens.split(|token| matches!(token, Token::Comma)) {
            if group.is_empty() {
                continue;
            }
            let item = parse_item(group)?;
            for existing in &items {
                if overlaps(existing, &item) {
                    return Err(CutplaceError::interface(format!(
                        "range items must not overlap: {} and {}",
                        render_item(existing),
                        render_item(&item)
                    )));
                }
            }
            items.push(item);
        }

        let mut lower_limit = None;
        let mut upper_limit = None;
        for (index, (lower, upper)) in items.iter().enumerate() {
            if index == 0 {
                lower_limit = *lower;
                upper_limit = *upper;
                continue;
            }
            match (lower_limit, lower) {
                (_, None) => lower_limit = None,
                (Some(current), Some(candidate)) if *candidate < current => lower_limit = Some(*candidate),
                _ => {}
            }
            match (upper_limit, upper) {
                (_, None) => upper_limit = None,
                (Some(current), Some(candidate)) if *candidate > current => upper_limit = Some(*candidate),
                _ => {}
            }
        }

        Ok(Range {
            description: Some(description.to_string()),
            items: items
                .into_iter()
                .map(|(lower, upper)| RangeItem { lower, upper })
                .collect(),
            lower_limit,
            upper_limit,
        })
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn items(&self) -> &[RangeItem] {
        &self.items
    }

    pub fn lower_limit(&self) -> Option<Decimal> {
        self.lower_limit
    }

    pub fn upper_limit(&self) -> Option<Decimal> {
        self.upper_limit
    }

    /// Whether this range was built from an empty description (accepts
    /// everything, as opposed to a single unbounded item).
    pub fn is_unbounded(&self) -> bool {
        self.description.is_none()
    }

    pub fn validate(&self, name: &str, value: Decimal, location: &Location) -> crate::error::Result<()> {
        if self.is_unbounded() {
            return Ok(());
        }
        if self.items.iter().any(|item| item.contains(value)) {
            Ok(())
        } else {
            Err(CutplaceError::range_value(format!(
                "{} is {} but must be within range: {}",
                name, value, self
            ))
            .with_location(location.clone()))
        }
    }

    /// Convenience for length/count checks expressed in `i64`.
    pub fn validate_count(&self, name: &str, value: i64, location: &Location) -> crate::error::Result<()> {
        self.validate(name, Decimal::from(value), location)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "None");
        }
        let rendered: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

fn overlaps(existing: &(Option<Decimal>, Option<Decimal>), candidate: &(Option<Decimal>, Option<Decimal>)) -> bool {
    let existing = RangeItem {
        lower: existing.0,
        upper: existing.1,
    };
    let candidate = RangeItem {
        lower: candidate.0,
        upper: candidate.1,
    };
    existing.overlaps(&candidate)
}

fn render_item(item: &(Option<Decimal>, Option<Decimal>)) -> String {
    RangeItem {
        lower: item.0,
        upper: item.1,
    }
    .to_string()
}

/// Collapses any run of three or more dots into a single ellipsis
/// character, so a stray extra dot (`"1....10"`) normalizes the same as
/// `"1...10"` instead of leaving an unmatched `.` for the tokenizer.
fn normalize_ellipsis(description: &str) -> String {
    let chars: Vec<char> = description.chars().collect();
    let mut result = String::with_capacity(chars.len());
    let mut index = 0;
    while index < chars.len() {
        if chars[index] == '.' {
            let run_start = index;
            while index < chars.len() && chars[index] == '.' {
                index += 1;
            }
            if index - run_start >= 3 {
                result.push(ELLIPSIS);
            } else {
                result.extend(&chars[run_start..index]);
            }
        } else {
            result.push(chars[index]);
            index += 1;
        }
    }
    result
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(Decimal),
    Ellipsis,
    Hyphen,
    Comma,
}

fn tokenize(description: &str) -> crate::error::Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = description.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let character = chars[index];
        if character.is_whitespace() {
            index += 1;
        } else if character == ',' {
            tokens.push(Token::Comma);
            index += 1;
        } else if character == '-' {
            tokens.push(Token::Hyphen);
            index += 1;
        } else if character == ELLIPSIS || character == ':' {
            tokens.push(Token::Ellipsis);
            index += 1;
        } else if character == '\'' || character == '"' {
            let quote = character;
            let start = index;
            index += 1;
            if index >= chars.len() || chars[index] == quote {
                return Err(quoted_literal_error(&chars[start..]));
            }
            let literal_char = chars[index];
            index += 1;
            if index >= chars.len() || chars[index] != quote {
                return Err(quoted_literal_error(&chars[start..]));
            }
            index += 1;
            tokens.push(Token::Number(Decimal::from(literal_char as u32)));
        } else if character.is_ascii_digit() {
            let start = index;
            if character == '0' && chars.get(index + 1).map(|c| c.to_ascii_lowercase()) == Some('x') {
                index += 2;
                let hex_start = index;
                while index < chars.len() && chars[index].is_ascii_hexdigit() {
                    index += 1;
                }
                let hex_text: String = chars[hex_start..index].iter().collect();
                let value = i64::from_str_radix(&hex_text, 16).map_err(|_| {
                    CutplaceError::interface(format!(
                        "number must be an integer or float but is: {:?}",
                        chars[start..index].iter().collect::<String>()
                    ))
                })?;
                tokens.push(Token::Number(Decimal::from(value)));
            } else {
                while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.') {
                    index += 1;
                }
                let number_text: String = chars[start..index].iter().collect();
                let value = number_text.parse::<Decimal>().map_err(|_| {
                    CutplaceError::interface(format!(
                        "number must be an integer or float but is: {:?}",
                        number_text
                    ))
                })?;
                tokens.push(Token::Number(value));
            }
        } else if character.is_alphabetic() {
            let start = index;
            while index < chars.len() && (chars[index].is_alphanumeric() || chars[index] == '_') {
                index += 1;
            }
            let name: String = chars[start..index].iter().collect();
            match symbolic_code(&name) {
                Some(code) => tokens.push(Token::Number(Decimal::from(code))),
                None => {
                    return Err(CutplaceError::interface(format!(
                        "symbolic name {:?} must be one of: cr, ff, lf, tab, vt",
                        name
                    )))
                }
            }
        } else {
            return Err(CutplaceError::interface(format!(
                "range must be specified using integer numbers, text, symbols and ellipsis (...) but found: {:?}",
                character
            )));
        }
    }
    Ok(tokens)
}

fn quoted_literal_error(remaining: &[char]) -> CutplaceError {
    let text: String = remaining.iter().take(3).collect();
    CutplaceError::interface(format!(
        "text for range must contain a single character but is: {:?}",
        text
    ))
}

fn parse_item(group: &[Token]) -> crate::error::Result<(Option<Decimal>, Option<Decimal>)> {
    let mut lower: Option<Decimal> = None;
    let mut upper: Option<Decimal> = None;
    let mut ellipsis_found = false;
    let mut after_hyphen = false;

    for token in group {
        match token {
            Token::Number(value) => {
                let mut value = *value;
                if after_hyphen {
                    value = -value;
                    after_hyphen = false;
                }
                if ellipsis_found {
                    if upper.is_none() {
                        upper = Some(value);
                    } else {
                        return Err(CutplaceError::interface(
                            "range must have at most lower and upper limit but found another number",
                        ));
                    }
                } else if lower.is_none() {
                    lower = Some(value);
                } else {
                    return Err(CutplaceError::interface(
                        "number must be followed by ellipsis (...) but found another number",
                    ));
                }
            }
            Token::Hyphen => {
                if after_hyphen {
                    return Err(CutplaceError::interface("hyphen (-) must be followed by number"));
                }
                after_hyphen = true;
            }
            Token::Ellipsis => {
                if after_hyphen {
                    return Err(CutplaceError::interface("hyphen (-) must be followed by number"));
                }
                ellipsis_found = true;
            }
            Token::Comma => unreachable!("groups are split on commas"),
        }
    }

    if after_hyphen {
        return Err(CutplaceError::interface("hyphen (-) at end must be followed by number"));
    }

    match (lower, upper, ellipsis_found) {
        (None, None, true) => Err(CutplaceError::interface(
            "ellipsis (...) must be preceded and/or succeeded by number",
        )),
        (None, None, false) => Ok((None, None)),
        (None, Some(upper), true) => Ok((None, Some(upper))),
        (Some(lower), Some(upper), true) if lower > upper => Err(CutplaceError::interface(format!(
            "lower range {} must be greater or equal than upper range {}",
            lower, upper
        ))),
        (Some(lower), upper, true) => Ok((Some(lower), upper)),
        (Some(lower), _, false) => Ok((Some(lower), Some(lower))),
        (None, Some(_), false) => unreachable!("upper without ellipsis requires lower"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location::new("test")
    }

    #[test]
    fn empty_range_accepts_anything() {
        let range = Range::parse("").unwrap();
        assert!(range.validate("x", Decimal::from(-1000), &location()).is_ok());
    }

    #[test]
    fn bounded_range() {
        let range = Range::parse("1...40").unwrap();
        assert!(range.validate("x", Decimal::from(1), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(40), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(41), &location()).is_err());
    }

    #[test]
    fn single_value() {
        let range = Range::parse("5").unwrap();
        assert!(range.validate("x", Decimal::from(5), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(4), &location()).is_err());
    }

    #[test]
    fn open_lower_bound() {
        let range = Range::parse("...40").unwrap();
        assert!(range.validate("x", Decimal::from(-1_000_000), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(41), &location()).is_err());
    }

    #[test]
    fn open_upper_bound() {
        let range = Range::parse("1...").unwrap();
        assert!(range.validate("x", Decimal::from(1_000_000), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(0), &location()).is_err());
    }

    #[test]
    fn colon_is_an_ellipsis_alias() {
        let range = Range::parse("1:40").unwrap();
        assert!(range.validate("x", Decimal::from(20), &location()).is_ok());
    }

    #[test]
    fn multiple_items_and_limits() {
        let range = Range::parse("1...10, 20...30").unwrap();
        assert_eq!(range.lower_limit(), Some(Decimal::from(1)));
        assert_eq!(range.upper_limit(), Some(Decimal::from(30)));
        assert!(range.validate("x", Decimal::from(15), &location()).is_err());
    }

    #[test]
    fn overlapping_items_rejected() {
        let error = Range::parse("1...10, 5...20").unwrap_err();
        assert_eq!(error.kind, crate::error::ErrorKind::Interface);
    }

    #[test]
    fn symbolic_names() {
        let range = Range::parse("tab").unwrap();
        assert!(range.validate("x", Decimal::from(9), &location()).is_ok());
    }

    #[test]
    fn hex_literal() {
        let range = Range::parse("0x1a").unwrap();
        assert!(range.validate("x", Decimal::from(26), &location()).is_ok());
    }

    #[test]
    fn single_character_literal() {
        let range = Range::parse("'A'...'Z'").unwrap();
        assert!(range.validate("x", Decimal::from('M' as u32), &location()).is_ok());
        assert!(range.validate("x", Decimal::from('a' as u32), &location()).is_err());
    }

    #[test]
    fn negative_numbers_via_hyphen() {
        let range = Range::parse("-10...-1").unwrap();
        assert!(range.validate("x", Decimal::from(-5), &location()).is_ok());
        assert!(range.validate("x", Decimal::from(0), &location()).is_err());
    }

    #[test]
    fn default_is_used_when_blank() {
        let range = Range::with_default(None, Some("0...2147483647")).unwrap();
        assert_eq!(range.lower_limit(), Some(Decimal::from(0)));
    }

    #[test]
    fn stray_extra_dot_in_ellipsis_still_normalizes() {
        let range = Range::parse("1....10").unwrap();
        assert!(range.validate("x", Decimal::from(5), &location()).is_ok());
    }
}
