use serde::Deserialize;

use crate::error::{ApiError, CoreError};
use crate::things::Thing;

/// Wire envelope for one page of a listing endpoint.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub kind: String,
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

/// Decodes a raw listing body into things, preserving the upstream
/// newest-first order.
///
/// Kinds the framework does not monitor are dropped here, so downstream
/// code only ever sees posts, comments and messages, each carrying a
/// fullname.
pub fn parse_listing(body: &[u8]) -> Result<Vec<Thing>, CoreError> {
    let listing: Listing = serde_json::from_slice(body)?;
    if listing.kind != "Listing" {
        return Err(ApiError::InvalidResponse {
            details: format!("expected a Listing envelope, got kind {:?}", listing.kind),
        }
        .into());
    }

    Ok(listing
        .data
        .children
        .into_iter()
        .filter(|thing| !matches!(thing, Thing::Unknown))
        .collect())
}
