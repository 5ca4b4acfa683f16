use serde::{Serialize, Serializer};

use crate::{domain::maps_url::Coordinates, error::ScrapeFailure};

/// One business listing as read from its detail view.
///
/// `main_photo` and `photos_count` are derived from `photos`, and the
/// coordinate pair lives in one `Option`, so neither can drift out of sync.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingRecord {
    /// Position of the card in the results feed.
    pub index: usize,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: u32,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub maps_url: String,
    pub place_id: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub categories: Vec<String>,
    pub photos: Vec<String>,
}

impl ListingRecord {
    pub fn main_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }

    pub fn photos_count(&self) -> usize {
        self.photos.len()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }
}

#[derive(Serialize)]
struct ListingRecordJson<'a> {
    name: Option<&'a str>,
    rating: Option<f64>,
    address: Option<&'a str>,
    google_maps_url: &'a str,
    place_id: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    categories: &'a [String],
    photos: &'a [String],
    main_photo: Option<&'a str>,
    photos_count: usize,
    website: Option<&'a str>,
    phone: Option<&'a str>,
    reviews_count: u32,
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ListingRecordJson {
            name: self.name.as_deref(),
            rating: self.rating,
            address: self.address.as_deref(),
            google_maps_url: &self.maps_url,
            place_id: self.place_id.as_deref(),
            latitude: self.latitude(),
            longitude: self.longitude(),
            categories: &self.categories,
            photos: &self.photos,
            main_photo: self.main_photo(),
            photos_count: self.photos_count(),
            website: self.website.as_deref(),
            phone: self.phone.as_deref(),
            reviews_count: self.reviews_count,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeResult {
    /// In feed order, at most `requested` long.
    pub records: Vec<ListingRecord>,
    pub requested: usize,
    /// Cards discovered before truncation to `requested`.
    pub found: usize,
    pub failure: Option<ScrapeFailure>,
}

impl ScrapeResult {
    pub fn empty(requested: usize) -> Self {
        ScrapeResult {
            records: vec![],
            requested,
            found: 0,
            failure: None,
        }
    }

    pub fn failed(requested: usize, found: usize, failure: ScrapeFailure) -> Self {
        ScrapeResult {
            records: vec![],
            requested,
            found,
            failure: Some(failure),
        }
    }

    /// A lost session still counts as success when it left records behind.
    pub fn is_success(&self) -> bool {
        match &self.failure {
            None => true,
            Some(ScrapeFailure::DriverLost(_)) => !self.records.is_empty(),
            Some(_) => false,
        }
    }
}
