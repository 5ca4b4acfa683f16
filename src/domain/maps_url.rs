use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

static VIEWPORT_COORDINATES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)").expect("valid @lat,lon regex"));
static PIN_COORDINATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!3d(-?\d+(?:\.\d+)?)!4d(-?\d+(?:\.\d+)?)").expect("valid !3d!4d regex")
});
static PLACE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!19s(ChIJ[A-Za-z0-9_-]+)").expect("valid place id regex"));
static FEATURE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!1s(0x[0-9a-fA-F]+:0x[0-9a-fA-F]+)").expect("valid feature id regex"));
static QUERY_PLACE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:query_place_id=|place_id:)([A-Za-z0-9_-]+)").expect("valid query place id regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        match valid {
            true => Some(Coordinates {
                latitude,
                longitude,
            }),
            false => None,
        }
    }
}

/// Fields recovered from a Maps detail URL rather than from the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedLocation {
    pub place_id: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl DerivedLocation {
    pub fn is_empty(&self) -> bool {
        self.place_id.is_none() && self.coordinates.is_none()
    }

    /// Fills whatever is missing here from `other`.
    pub fn or(self, other: DerivedLocation) -> DerivedLocation {
        DerivedLocation {
            place_id: self.place_id.or(other.place_id),
            coordinates: self.coordinates.or(other.coordinates),
        }
    }
}

fn capture_coordinates(pattern: &Regex, url: &str) -> Option<Coordinates> {
    let captures = pattern.captures(url)?;
    let latitude = captures.get(1)?.as_str().parse().ok()?;
    let longitude = captures.get(2)?.as_str().parse().ok()?;
    Coordinates::new(latitude, longitude)
}

pub fn derive_coordinates(url: &str) -> Option<Coordinates> {
    capture_coordinates(&VIEWPORT_COORDINATES, url)
        .or_else(|| capture_coordinates(&PIN_COORDINATES, url))
}

pub fn derive_place_id(url: &str) -> Option<String> {
    [&*PLACE_ID, &*FEATURE_ID, &*QUERY_PLACE_ID]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

pub fn derive(url: &str) -> DerivedLocation {
    DerivedLocation {
        place_id: derive_place_id(url),
        coordinates: derive_coordinates(url),
    }
}

/// `https://www.google.com/maps/search/` + `Restaurant Batumi` + `ka` ->
/// `https://www.google.com/maps/search/Restaurant+Batumi?hl=ka`
pub fn search_url(base_url: &str, query: &str, locale: &str) -> String {
    let encoded_query: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let encoded_locale: String = form_urlencoded::byte_serialize(locale.as_bytes()).collect();
    let separator = match base_url.ends_with('/') {
        true => "",
        false => "/",
    };

    format!(
        "{}{}{}?hl={}",
        base_url, separator, encoded_query, encoded_locale
    )
}
