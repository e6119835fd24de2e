use crate::error::{FilterErrors, TokenError};
use crate::query::ast::{
    FieldKind, FilterSpec, FilterSpecBuilder, NumericBound, Predicate, Relation, Resolution,
    SortSpec,
};
use crate::query::lexer::{Lexer, RawToken};
use std::fmt::Display;
use std::str::FromStr;

/// Parse a filter string into a validated `FilterSpec`.
///
/// Every bad token is reported, not just the first.
pub fn parse_filter(input: &str) -> Result<FilterSpec, FilterErrors> {
    FilterSpec::builder().parse(input).build()
}

/// Parse one raw value for a known field, e.g. a `--year 2020-2024` flag.
pub fn parse_field_value(field: FieldKind, value: &str) -> Result<Predicate, TokenError> {
    let token = format!("{field}:{value}");
    if value.is_empty() {
        return Err(TokenError::syntax(token, "empty value"));
    }
    let predicate = parse_value(field, value, &token)?;
    predicate.check(&token)?;
    Ok(predicate)
}

/// Parse a sort token value such as `rating_desc`.
pub fn parse_sort_value(value: &str) -> Result<SortSpec, TokenError> {
    SortSpec::parse(value).ok_or_else(|| TokenError::InvalidSort {
        token: format!("sort:{value}"),
        expected: SortSpec::EXPECTED,
    })
}

/// Raw-text entry points, so string tokens and discrete values can share
/// one builder and one error report.
impl FilterSpecBuilder {
    /// Add every token of a filter string.
    pub fn parse(&mut self, input: &str) -> &mut Self {
        FilterParser::new(input, self).parse();
        self
    }

    /// Add one raw value for `field`.
    pub fn raw_value(&mut self, field: FieldKind, value: &str) -> &mut Self {
        match parse_field_value(field, value) {
            Ok(predicate) => self.predicate(predicate),
            Err(err) => self.reject(err),
        }
    }

    /// Set the sort from a raw sort token value.
    pub fn raw_sort(&mut self, value: &str) -> &mut Self {
        self.push_sort(parse_sort_value(value), &format!("sort:{value}"))
    }
}

/// Filter parser
struct FilterParser<'a, 'b> {
    lexer: Lexer<'a>,
    builder: &'b mut FilterSpecBuilder,
}

impl<'a, 'b> FilterParser<'a, 'b> {
    fn new(input: &'a str, builder: &'b mut FilterSpecBuilder) -> Self {
        Self {
            lexer: Lexer::new(input),
            builder,
        }
    }

    fn parse(&mut self) {
        while let Some(lexed) = self.lexer.next() {
            match lexed {
                Ok(token) => self.parse_token(token),
                Err(err) => {
                    self.builder.reject(err);
                }
            }
        }
    }

    fn parse_token(&mut self, token: RawToken<'a>) {
        match token {
            // The only bare keyword is `hdr`
            RawToken::Keyword { text } => {
                self.builder.push_predicate(Predicate::Hdr(true), text);
            }
            RawToken::Pair { text, key, value } => {
                if key.eq_ignore_ascii_case("sort") {
                    let parsed = SortSpec::parse(value).ok_or_else(|| TokenError::InvalidSort {
                        token: text.to_string(),
                        expected: SortSpec::EXPECTED,
                    });
                    self.builder.push_sort(parsed, text);
                    return;
                }

                let Some(field) = FieldKind::from_key(key) else {
                    self.builder.reject(TokenError::UnknownField {
                        token: text.to_string(),
                        key: key.to_string(),
                    });
                    return;
                };

                match parse_value(field, value, text) {
                    Ok(predicate) => self.builder.push_predicate(predicate, text),
                    Err(err) => self.builder.reject(err),
                };
            }
        }
    }
}

/// Dispatch to the value grammar of `field`.
fn parse_value(field: FieldKind, value: &str, token: &str) -> Result<Predicate, TokenError> {
    let related = |relation| Predicate::Related {
        relation,
        needle: value.to_string(),
    };

    let predicate = match field {
        FieldKind::Title => Predicate::Title(value.to_string()),
        FieldKind::Codec => Predicate::Codec(value.to_string()),
        FieldKind::Year => Predicate::Year(parse_bound(value, token)?),
        FieldKind::Runtime => Predicate::Runtime(parse_bound(value, token)?),
        FieldKind::Rating => Predicate::Rating(parse_bound(value, token)?),
        FieldKind::Resolution => {
            let resolution = Resolution::parse(value).ok_or_else(|| TokenError::InvalidEnum {
                token: token.to_string(),
                expected: Resolution::EXPECTED,
            })?;
            Predicate::Resolution(resolution)
        }
        FieldKind::Hdr => Predicate::Hdr(parse_bool(value, token)?),
        FieldKind::Genre => related(Relation::Genre),
        FieldKind::Actor => related(Relation::Actor),
        FieldKind::Director => related(Relation::Director),
        FieldKind::Studio => related(Relation::Studio),
        FieldKind::Country => related(Relation::Country),
        FieldKind::Set => related(Relation::Set),
        FieldKind::Tag => related(Relation::Tag),
    };
    Ok(predicate)
}

/// Numbers accepted by numeric fields.
trait Operand: FromStr + PartialOrd + Copy + Display {
    fn is_valid(&self) -> bool;
}

impl Operand for i64 {
    fn is_valid(&self) -> bool {
        true
    }
}

impl Operand for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

/// `N`, `>N`, `<N` or `N-M`.
fn parse_bound<T: Operand>(value: &str, token: &str) -> Result<NumericBound<T>, TokenError> {
    if let Some(rest) = value.strip_prefix('>') {
        return Ok(NumericBound::GreaterThan(parse_number(rest, token)?));
    }
    if let Some(rest) = value.strip_prefix('<') {
        return Ok(NumericBound::LessThan(parse_number(rest, token)?));
    }
    if let Some((min, max)) = split_range(value) {
        let min: T = parse_number(min, token)?;
        let max: T = parse_number(max, token)?;
        if min > max {
            return Err(TokenError::InvalidRange {
                token: token.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        return Ok(NumericBound::Between(min, max));
    }
    Ok(NumericBound::Equals(parse_number(value, token)?))
}

/// Split `N-M` on the first `-` that is not an exponent sign, so
/// `1e-3-9` is the range 0.001 to 9.
fn split_range(value: &str) -> Option<(&str, &str)> {
    let bytes = value.as_bytes();
    let at = bytes
        .iter()
        .enumerate()
        .position(|(i, &b)| b == b'-' && (i == 0 || !matches!(bytes[i - 1], b'e' | b'E')))?;
    Some((&value[..at], &value[at + 1..]))
}

fn parse_number<T: Operand>(text: &str, token: &str) -> Result<T, TokenError> {
    if text.is_empty() {
        return Err(TokenError::syntax(token, "missing number"));
    }
    match text.parse::<T>() {
        Ok(n) if n.is_valid() => Ok(n),
        _ => Err(TokenError::syntax(token, format!("`{text}` is not a valid number"))),
    }
}

fn parse_bool(value: &str, token: &str) -> Result<bool, TokenError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(TokenError::InvalidEnum {
            token: token.to_string(),
            expected: "true, false, 1, 0",
        }),
    }
}
