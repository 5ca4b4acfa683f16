use serde::Deserialize;

/// The listing fields read from a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Rating,
    ReviewsCount,
    Address,
    Website,
    Phone,
    Categories,
    Photos,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Name,
        FieldKind::Rating,
        FieldKind::ReviewsCount,
        FieldKind::Address,
        FieldKind::Website,
        FieldKind::Phone,
        FieldKind::Categories,
        FieldKind::Photos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Rating => "rating",
            FieldKind::ReviewsCount => "reviews_count",
            FieldKind::Address => "address",
            FieldKind::Website => "website",
            FieldKind::Phone => "phone",
            FieldKind::Categories => "categories",
            FieldKind::Photos => "photos",
        }
    }
}

/// Where a strategy looks: the whole page (detail view) or the card it
/// was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyScope {
    Page,
    Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Text,
    Attribute(String),
}

impl ValueSource {
    pub fn attribute(name: &str) -> Self {
        ValueSource::Attribute(name.to_string())
    }
}

/// Text cleanup applied to a raw value before the field parser sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// `"Address: 12 Rustaveli Ave"` -> `"12 Rustaveli Ave"`
    StripLabel,
    /// `"4.6\n(1,204)"` -> `"(1,204)"`
    LastLine,
}

impl Transform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Transform::StripLabel => match raw.split_once(':') {
                Some((_, rest)) => rest.trim().to_string(),
                None => raw.trim().to_string(),
            },
            Transform::LastLine => raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// One rung of a strategy ladder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractionStrategy {
    pub scope: StrategyScope,
    /// `None` only makes sense with [`StrategyScope::Card`]: read the card itself.
    #[serde(default)]
    pub selector: Option<String>,
    pub source: ValueSource,
    #[serde(default)]
    pub transform: Option<Transform>,
}

impl ExtractionStrategy {
    pub fn page(selector: &str, source: ValueSource) -> Self {
        ExtractionStrategy {
            scope: StrategyScope::Page,
            selector: Some(selector.to_string()),
            source,
            transform: None,
        }
    }

    pub fn with_transform_strip_label(mut self) -> Self {
        self.transform = Some(Transform::StripLabel);
        self
    }

    pub fn with_transform_last_line(mut self) -> Self {
        self.transform = Some(Transform::LastLine);
        self
    }

    pub fn describe(&self) -> String {
        let target = match (&self.scope, &self.selector) {
            (StrategyScope::Page, Some(css)) => css.clone(),
            (StrategyScope::Card, Some(css)) => format!("card {}", css),
            (StrategyScope::Card, None) => "card".to_string(),
            (StrategyScope::Page, None) => "<page>".to_string(),
        };
        match &self.source {
            ValueSource::Text => format!("{} (text)", target),
            ValueSource::Attribute(name) => format!("{} [{}]", target, name),
        }
    }
}
