//! Filter AST: typed predicates, sort order and the validated `FilterSpec`.
//!
//! A `FilterSpec` is immutable once built. Every predicate inside it has
//! already passed validation, so the compiler never has to reject anything.

use crate::error::{FilterErrors, TokenError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filterable fields, in the order they are documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Title,
    Year,
    Rating,
    Runtime,
    Genre,
    Actor,
    Director,
    Studio,
    Country,
    Set,
    Tag,
    Codec,
    Resolution,
    Hdr,
}

impl FieldKind {
    pub const ALL: [FieldKind; 14] = [
        FieldKind::Title,
        FieldKind::Year,
        FieldKind::Rating,
        FieldKind::Runtime,
        FieldKind::Genre,
        FieldKind::Actor,
        FieldKind::Director,
        FieldKind::Studio,
        FieldKind::Country,
        FieldKind::Set,
        FieldKind::Tag,
        FieldKind::Codec,
        FieldKind::Resolution,
        FieldKind::Hdr,
    ];

    /// Exact, case-insensitive key lookup. No aliases.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(key))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Year => "year",
            FieldKind::Rating => "rating",
            FieldKind::Runtime => "runtime",
            FieldKind::Genre => "genre",
            FieldKind::Actor => "actor",
            FieldKind::Director => "director",
            FieldKind::Studio => "studio",
            FieldKind::Country => "country",
            FieldKind::Set => "set",
            FieldKind::Tag => "tag",
            FieldKind::Codec => "codec",
            FieldKind::Resolution => "resolution",
            FieldKind::Hdr => "hdr",
        }
    }

    /// The many-to-many relation behind this field, if it is multi-valued.
    pub fn relation(&self) -> Option<Relation> {
        match self {
            FieldKind::Genre => Some(Relation::Genre),
            FieldKind::Actor => Some(Relation::Actor),
            FieldKind::Director => Some(Relation::Director),
            FieldKind::Studio => Some(Relation::Studio),
            FieldKind::Country => Some(Relation::Country),
            FieldKind::Set => Some(Relation::Set),
            FieldKind::Tag => Some(Relation::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-valued relations, each backed by a junction table keyed by file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Genre,
    Actor,
    Director,
    Studio,
    Country,
    Set,
    Tag,
}

impl Relation {
    pub fn field(&self) -> FieldKind {
        match self {
            Relation::Genre => FieldKind::Genre,
            Relation::Actor => FieldKind::Actor,
            Relation::Director => FieldKind::Director,
            Relation::Studio => FieldKind::Studio,
            Relation::Country => FieldKind::Country,
            Relation::Set => FieldKind::Set,
            Relation::Tag => FieldKind::Tag,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.field().as_str()
    }

    /// Junction table mapping files to entities.
    pub fn junction_table(&self) -> &'static str {
        match self {
            Relation::Genre => "media_genres",
            Relation::Actor => "media_actors",
            Relation::Director => "media_directors",
            Relation::Studio => "media_studios",
            Relation::Country => "media_countries",
            Relation::Set => "media_sets",
            Relation::Tag => "media_tags",
        }
    }

    /// Lookup table holding entity names.
    pub fn entity_table(&self) -> &'static str {
        match self {
            Relation::Genre => "genres",
            Relation::Actor | Relation::Director => "people",
            Relation::Studio => "studios",
            Relation::Country => "countries",
            Relation::Set => "sets",
            Relation::Tag => "tags",
        }
    }

    /// Key column shared by the junction and lookup tables.
    pub fn entity_key(&self) -> &'static str {
        match self {
            Relation::Genre => "genre_id",
            Relation::Actor | Relation::Director => "person_id",
            Relation::Studio => "studio_id",
            Relation::Country => "country_id",
            Relation::Set => "set_id",
            Relation::Tag => "tag_id",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    /// Case-insensitive substring match
    Contains,
    GreaterThan,
    LessThan,
    /// Inclusive on both ends
    Range,
    Boolean,
}

/// Predicate operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    IntRange(i64, i64),
    FloatRange(f64, f64),
    Boolean(bool),
}

/// Numeric match on year, rating or runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericBound<T> {
    Equals(T),
    /// Strictly greater
    GreaterThan(T),
    /// Strictly less
    LessThan(T),
    /// Inclusive `min..=max`
    Between(T, T),
}

impl<T: Copy> NumericBound<T> {
    pub fn operator(&self) -> Operator {
        match self {
            NumericBound::Equals(_) => Operator::Equals,
            NumericBound::GreaterThan(_) => Operator::GreaterThan,
            NumericBound::LessThan(_) => Operator::LessThan,
            NumericBound::Between(..) => Operator::Range,
        }
    }
}

impl<T: fmt::Display> fmt::Display for NumericBound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericBound::Equals(v) => write!(f, "{v}"),
            NumericBound::GreaterThan(v) => write!(f, ">{v}"),
            NumericBound::LessThan(v) => write!(f, "<{v}"),
            NumericBound::Between(min, max) => write!(f, "{min}-{max}"),
        }
    }
}

/// Resolution classes. Not a stored column; compiled to dimension thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// width >= 3840
    FourK,
    /// 1080 <= height < 2160
    Hd,
    /// 720 <= height < 1080
    Hd720,
}

impl Resolution {
    pub const EXPECTED: &'static str = "4k, hd, 720p";

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "4k" => Some(Resolution::FourK),
            "hd" => Some(Resolution::Hd),
            "720p" => Some(Resolution::Hd720),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::FourK => "4k",
            Resolution::Hd => "hd",
            Resolution::Hd720 => "720p",
        }
    }
}

/// One typed filter condition.
///
/// Scalar variants target the file, metadata or technical-info row of a
/// record. `Related` targets a junction relation and is compiled as its own
/// existence check.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Title(String),
    Year(NumericBound<i64>),
    Rating(NumericBound<f64>),
    Runtime(NumericBound<i64>),
    Related { relation: Relation, needle: String },
    Codec(String),
    Resolution(Resolution),
    Hdr(bool),
}

impl Predicate {
    pub fn field(&self) -> FieldKind {
        match self {
            Predicate::Title(_) => FieldKind::Title,
            Predicate::Year(_) => FieldKind::Year,
            Predicate::Rating(_) => FieldKind::Rating,
            Predicate::Runtime(_) => FieldKind::Runtime,
            Predicate::Related { relation, .. } => relation.field(),
            Predicate::Codec(_) => FieldKind::Codec,
            Predicate::Resolution(_) => FieldKind::Resolution,
            Predicate::Hdr(_) => FieldKind::Hdr,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Predicate::Title(_) | Predicate::Codec(_) | Predicate::Related { .. } => {
                Operator::Contains
            }
            Predicate::Year(bound) | Predicate::Runtime(bound) => bound.operator(),
            Predicate::Rating(bound) => bound.operator(),
            Predicate::Resolution(_) => Operator::Equals,
            Predicate::Hdr(_) => Operator::Boolean,
        }
    }

    pub fn operand(&self) -> Value {
        fn int(bound: &NumericBound<i64>) -> Value {
            match *bound {
                NumericBound::Equals(v) | NumericBound::GreaterThan(v) | NumericBound::LessThan(v) => {
                    Value::Integer(v)
                }
                NumericBound::Between(min, max) => Value::IntRange(min, max),
            }
        }

        match self {
            Predicate::Title(text) | Predicate::Codec(text) => Value::Text(text.clone()),
            Predicate::Related { needle, .. } => Value::Text(needle.clone()),
            Predicate::Year(bound) | Predicate::Runtime(bound) => int(bound),
            Predicate::Rating(bound) => match *bound {
                NumericBound::Equals(v) | NumericBound::GreaterThan(v) | NumericBound::LessThan(v) => {
                    Value::Float(v)
                }
                NumericBound::Between(min, max) => Value::FloatRange(min, max),
            },
            Predicate::Resolution(res) => Value::Text(res.as_str().to_string()),
            Predicate::Hdr(flag) => Value::Boolean(*flag),
        }
    }

    /// Check internal consistency. `token` names the predicate in errors.
    pub(crate) fn check(&self, token: &str) -> Result<(), TokenError> {
        match self {
            Predicate::Title(text) | Predicate::Codec(text) | Predicate::Related { needle: text, .. } => {
                if text.trim().is_empty() {
                    return Err(TokenError::syntax(token, "empty value"));
                }
            }
            Predicate::Year(bound) | Predicate::Runtime(bound) => check_range(token, bound)?,
            Predicate::Rating(bound) => {
                let finite = match *bound {
                    NumericBound::Equals(v) | NumericBound::GreaterThan(v) | NumericBound::LessThan(v) => {
                        v.is_finite()
                    }
                    NumericBound::Between(min, max) => min.is_finite() && max.is_finite(),
                };
                if !finite {
                    return Err(TokenError::syntax(token, "rating must be a finite number"));
                }
                check_range(token, bound)?;
            }
            Predicate::Resolution(_) | Predicate::Hdr(_) => {}
        }
        Ok(())
    }
}

fn check_range<T: PartialOrd + fmt::Display>(
    token: &str,
    bound: &NumericBound<T>,
) -> Result<(), TokenError> {
    if let NumericBound::Between(min, max) = bound {
        if min > max {
            return Err(TokenError::InvalidRange {
                token: token.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
    }
    Ok(())
}

/// Renders the predicate back into filter syntax.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field();
        match self {
            Predicate::Title(text) | Predicate::Codec(text) => write!(f, "{field}:{text}"),
            Predicate::Related { needle, .. } => write!(f, "{field}:{needle}"),
            Predicate::Year(bound) | Predicate::Runtime(bound) => write!(f, "{field}:{bound}"),
            Predicate::Rating(bound) => write!(f, "{field}:{bound}"),
            Predicate::Resolution(res) => write!(f, "{field}:{}", res.as_str()),
            Predicate::Hdr(flag) => write!(f, "{field}:{flag}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Year,
    Rating,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Result ordering. `Random` is a fresh shuffle on every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSpec {
    By {
        field: SortField,
        direction: SortDirection,
    },
    Random,
}

impl SortSpec {
    pub const EXPECTED: &'static str = "title_asc, title_desc, year_asc, year_desc, \
        rating_asc, rating_desc, runtime_asc, runtime_desc, random";

    pub const fn by(field: SortField, direction: SortDirection) -> Self {
        SortSpec::By { field, direction }
    }

    /// Parse one of the nine sort tokens, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        use SortDirection::*;
        use SortField::*;

        let sort = match value.to_ascii_lowercase().as_str() {
            "title_asc" => Self::by(Title, Asc),
            "title_desc" => Self::by(Title, Desc),
            "year_asc" => Self::by(Year, Asc),
            "year_desc" => Self::by(Year, Desc),
            "rating_asc" => Self::by(Rating, Asc),
            "rating_desc" => Self::by(Rating, Desc),
            "runtime_asc" => Self::by(Runtime, Asc),
            "runtime_desc" => Self::by(Runtime, Desc),
            "random" => SortSpec::Random,
            _ => return None,
        };
        Some(sort)
    }

    pub fn as_str(&self) -> &'static str {
        use SortDirection::*;
        use SortField::*;

        match self {
            SortSpec::Random => "random",
            SortSpec::By { field, direction } => match (field, direction) {
                (Title, Asc) => "title_asc",
                (Title, Desc) => "title_desc",
                (Year, Asc) => "year_asc",
                (Year, Desc) => "year_desc",
                (Rating, Asc) => "rating_asc",
                (Rating, Desc) => "rating_desc",
                (Runtime, Asc) => "runtime_asc",
                (Runtime, Desc) => "runtime_desc",
            },
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::by(SortField::Title, SortDirection::Asc)
    }
}

/// Optional paging. Not part of the filter syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// `None` returns every matching record
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Validated, immutable filter request: conjunctive predicates plus an
/// optional sort and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
    sort: Option<SortSpec>,
    page: Page,
}

impl FilterSpec {
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// Predicates in input order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Copy of this filter with different paging.
    pub fn with_page(&self, page: Page) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// Renders the filter in canonical syntax (predicates, then sort).
impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for predicate in &self.predicates {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{predicate}")?;
            first = false;
        }
        if let Some(sort) = self.sort {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "sort:{}", sort.as_str())?;
        }
        Ok(())
    }
}

/// Collects predicates from either the string parser or discrete values.
///
/// Problems are recorded rather than returned immediately; `build` reports
/// all of them at once.
#[derive(Debug, Clone, Default)]
pub struct FilterSpecBuilder {
    predicates: Vec<Predicate>,
    sort: Option<SortSpec>,
    /// Set by the first sort token, even one that failed to parse
    sort_seen: bool,
    page: Page,
    errors: Vec<TokenError>,
}

impl FilterSpecBuilder {
    /// Add a predicate, validating it.
    pub fn predicate(&mut self, predicate: Predicate) -> &mut Self {
        let token = predicate.to_string();
        self.push_predicate(predicate, &token)
    }

    pub(crate) fn push_predicate(&mut self, predicate: Predicate, token: &str) -> &mut Self {
        match predicate.check(token) {
            Ok(()) => self.predicates.push(predicate),
            Err(err) => self.errors.push(err),
        }
        self
    }

    pub fn title(&mut self, text: impl Into<String>) -> &mut Self {
        self.predicate(Predicate::Title(text.into()))
    }

    pub fn related(&mut self, relation: Relation, needle: impl Into<String>) -> &mut Self {
        self.predicate(Predicate::Related {
            relation,
            needle: needle.into(),
        })
    }

    pub fn genre(&mut self, needle: impl Into<String>) -> &mut Self {
        self.related(Relation::Genre, needle)
    }

    pub fn actor(&mut self, needle: impl Into<String>) -> &mut Self {
        self.related(Relation::Actor, needle)
    }

    pub fn director(&mut self, needle: impl Into<String>) -> &mut Self {
        self.related(Relation::Director, needle)
    }

    pub fn year(&mut self, bound: NumericBound<i64>) -> &mut Self {
        self.predicate(Predicate::Year(bound))
    }

    pub fn rating(&mut self, bound: NumericBound<f64>) -> &mut Self {
        self.predicate(Predicate::Rating(bound))
    }

    pub fn runtime(&mut self, bound: NumericBound<i64>) -> &mut Self {
        self.predicate(Predicate::Runtime(bound))
    }

    pub fn codec(&mut self, text: impl Into<String>) -> &mut Self {
        self.predicate(Predicate::Codec(text.into()))
    }

    pub fn resolution(&mut self, resolution: Resolution) -> &mut Self {
        self.predicate(Predicate::Resolution(resolution))
    }

    pub fn hdr(&mut self, flag: bool) -> &mut Self {
        self.predicate(Predicate::Hdr(flag))
    }

    /// Set the ordering. A second call is a `DuplicateSort` error.
    pub fn sort(&mut self, sort: SortSpec) -> &mut Self {
        let token = format!("sort:{}", sort.as_str());
        self.push_sort(Ok(sort), &token)
    }

    /// Record one sort token. Every sort token after the first is a
    /// `DuplicateSort`, whether or not the first one was valid.
    pub(crate) fn push_sort(
        &mut self,
        parsed: Result<SortSpec, TokenError>,
        token: &str,
    ) -> &mut Self {
        if self.sort_seen {
            self.errors.push(TokenError::DuplicateSort {
                token: token.to_string(),
            });
            return self;
        }
        self.sort_seen = true;
        match parsed {
            Ok(sort) => self.sort = Some(sort),
            Err(err) => self.errors.push(err),
        }
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.page.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: usize) -> &mut Self {
        self.page.offset = offset;
        self
    }

    pub(crate) fn reject(&mut self, err: TokenError) -> &mut Self {
        self.errors.push(err);
        self
    }

    /// Finish, reporting every recorded problem together.
    pub fn build(&self) -> Result<FilterSpec, FilterErrors> {
        if let Some(errors) = FilterErrors::from_vec(self.errors.clone()) {
            return Err(errors);
        }
        Ok(FilterSpec {
            predicates: self.predicates.clone(),
            sort: self.sort,
            page: self.page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        assert_eq!(FieldKind::from_key("GENRE"), Some(FieldKind::Genre));
        assert_eq!(FieldKind::from_key("Hdr"), Some(FieldKind::Hdr));
        assert_eq!(FieldKind::from_key("collection"), None);
        assert_eq!(FieldKind::from_key("sort"), None);
    }

    #[test]
    fn test_every_relation_round_trips_through_its_field() {
        for field in FieldKind::ALL {
            if let Some(relation) = field.relation() {
                assert_eq!(relation.field(), field);
            }
        }
    }

    #[test]
    fn test_predicate_shape() {
        let p = Predicate::Year(NumericBound::Between(2020, 2024));
        assert_eq!(p.field(), FieldKind::Year);
        assert_eq!(p.operator(), Operator::Range);
        assert_eq!(p.operand(), Value::IntRange(2020, 2024));

        let p = Predicate::Related {
            relation: Relation::Genre,
            needle: "action".to_string(),
        };
        assert_eq!(p.operator(), Operator::Contains);
        assert_eq!(p.operand(), Value::Text("action".to_string()));

        assert_eq!(Predicate::Hdr(true).operator(), Operator::Boolean);
        assert_eq!(
            Predicate::Rating(NumericBound::GreaterThan(7.0)).operand(),
            Value::Float(7.0)
        );
    }

    #[test]
    fn test_predicate_display_is_filter_syntax() {
        assert_eq!(
            Predicate::Rating(NumericBound::GreaterThan(7.5)).to_string(),
            "rating:>7.5"
        );
        assert_eq!(
            Predicate::Year(NumericBound::Between(2020, 2024)).to_string(),
            "year:2020-2024"
        );
        assert_eq!(Predicate::Resolution(Resolution::FourK).to_string(), "resolution:4k");
        assert_eq!(Predicate::Hdr(false).to_string(), "hdr:false");
    }

    #[test]
    fn test_sort_tokens() {
        for token in SortSpec::EXPECTED.split(", ") {
            let sort = SortSpec::parse(token).unwrap();
            assert_eq!(sort.as_str(), token);
        }
        assert_eq!(SortSpec::parse("RATING_DESC"), Some(SortSpec::by(SortField::Rating, SortDirection::Desc)));
        assert_eq!(SortSpec::parse("size_desc"), None);
    }

    #[test]
    fn test_builder_rejects_inverted_range() {
        let err = FilterSpec::builder()
            .year(NumericBound::Between(2024, 2020))
            .build()
            .unwrap_err();
        assert!(matches!(
            &err.errors()[0],
            TokenError::InvalidRange { token, .. } if token == "year:2024-2020"
        ));
    }

    #[test]
    fn test_builder_rejects_non_finite_rating() {
        let err = FilterSpec::builder()
            .rating(NumericBound::GreaterThan(f64::NAN))
            .build()
            .unwrap_err();
        assert!(matches!(err.errors()[0], TokenError::Syntax { .. }));
    }

    #[test]
    fn test_builder_aggregates_errors() {
        let err = FilterSpec::builder()
            .genre("")
            .sort(SortSpec::Random)
            .sort(SortSpec::default())
            .runtime(NumericBound::Between(200, 90))
            .build()
            .unwrap_err();
        assert_eq!(err.len(), 3);
        assert!(matches!(err.errors()[1], TokenError::DuplicateSort { .. }));
    }

    #[test]
    fn test_builder_keeps_order_and_paging() {
        let spec = FilterSpec::builder()
            .genre("action")
            .year(NumericBound::GreaterThan(2000))
            .actor("cruise")
            .limit(10)
            .offset(5)
            .build()
            .unwrap();

        let fields: Vec<_> = spec.predicates().iter().map(Predicate::field).collect();
        assert_eq!(fields, vec![FieldKind::Genre, FieldKind::Year, FieldKind::Actor]);
        assert_eq!(spec.page(), Page { limit: Some(10), offset: 5 });
        assert_eq!(spec.sort(), None);
    }

    #[test]
    fn test_filter_spec_display() {
        let spec = FilterSpec::builder()
            .genre("action")
            .rating(NumericBound::GreaterThan(7.0))
            .sort(SortSpec::by(SortField::Year, SortDirection::Desc))
            .build()
            .unwrap();
        assert_eq!(spec.to_string(), "genre:action rating:>7 sort:year_desc");
    }
}
