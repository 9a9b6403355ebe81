use crate::lookup::errors::LookupError;
use crate::model::{Id, Volume};
use chrono::{Datelike as _, NaiveDate};
use log::warn;
use serde::Deserialize;

/// What Google Books knows about one volume
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMetadata {
    /// The main title of the volume.
    pub title: String,
    /// An optional subtitle, appended to the title when building a volume.
    pub subtitle: Option<String>,
    /// Author names in the order Google Books lists them.
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    /// Year of first publication, taken from `publishedDate`.
    pub copyright_year: Option<i32>,
    /// ISBN-13 if listed, otherwise ISBN-10.
    pub isbn: Option<String>,
}

impl VolumeMetadata {
    /// Builds an unsaved volume draft for `library_id` out of the metadata
    #[must_use]
    #[inline]
    pub fn into_volume(self, library_id: Id) -> Volume {
        let name = match self.subtitle {
            Some(subtitle) => format!("{}: {subtitle}", self.title),
            None => self.title,
        };
        let mut volume = Volume::new(library_id, name);
        volume.copyright = self.copyright_year.map(|year| year.to_string());
        volume.isbn = self.isbn;
        volume
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<VolumeItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    volume_info: VolumeInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// Parses the body of a `volumes?q=isbn:` search. Only the first item is used; an empty result
/// is `Ok(None)`.
/// # Errors
/// Returns `LookupError::Parse` if the body is not a volumes response
#[allow(clippy::missing_inline_in_public_items, reason = "Called once per lookup")]
pub fn parse_volumes_response(body: &str) -> Result<Option<VolumeMetadata>, LookupError> {
    let response: VolumesResponse = serde_json::from_str(body)?;
    let Some(item) = response.items.into_iter().next() else {
        return Ok(None);
    };
    let info = item.volume_info;
    if info.title.trim().is_empty() {
        warn!("Volume without title in lookup response");
        return Ok(None);
    }

    let copyright_year = info.published_date.as_deref().and_then(parse_year);
    let isbn = pick_isbn(&info.industry_identifiers);
    Ok(Some(VolumeMetadata {
        title: info.title.trim().to_owned(),
        subtitle: info
            .subtitle
            .map(|subtitle| subtitle.trim().to_owned())
            .filter(|subtitle| !subtitle.is_empty()),
        authors: info.authors,
        publisher: info.publisher,
        copyright_year,
        isbn,
    }))
}

/// `publishedDate` comes as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
fn parse_year(published: &str) -> Option<i32> {
    let padded = match published.matches('-').count() {
        0 => format!("{published}-01-01"),
        1 => format!("{published}-01"),
        _ => published.to_owned(),
    };
    let year = NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .map(|date| date.year());
    if year.is_none() {
        warn!("Failed to parse publication date '{published}'");
    }
    year
}

fn pick_isbn(identifiers: &[IndustryIdentifier]) -> Option<String> {
    ["ISBN_13", "ISBN_10"].into_iter().find_map(|wanted| {
        identifiers
            .iter()
            .find(|identifier| identifier.kind == wanted)
            .map(|identifier| identifier.identifier.clone())
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::UNSAVED_ID;
    use pretty_assertions::assert_eq;

    const HOBBIT: &str = r#"{
        "kind": "books#volumes",
        "totalItems": 1,
        "items": [{
            "id": "pD6arNyKyi8C",
            "volumeInfo": {
                "title": "The Hobbit",
                "subtitle": "or There and Back Again",
                "authors": ["J. R. R. Tolkien"],
                "publisher": "HarperCollins",
                "publishedDate": "2009-04-20",
                "industryIdentifiers": [
                    { "type": "ISBN_10", "identifier": "0007322607" },
                    { "type": "ISBN_13", "identifier": "9780007322602" }
                ]
            }
        }]
    }"#;

    #[test]
    fn parses_first_item() {
        let metadata = parse_volumes_response(HOBBIT).unwrap().unwrap();
        assert_eq!(
            metadata,
            VolumeMetadata {
                title: String::from("The Hobbit"),
                subtitle: Some(String::from("or There and Back Again")),
                authors: vec![String::from("J. R. R. Tolkien")],
                publisher: Some(String::from("HarperCollins")),
                copyright_year: Some(2009),
                isbn: Some(String::from("9780007322602")),
            }
        );
    }

    #[test]
    fn no_items_is_none() {
        assert_eq!(
            parse_volumes_response(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(
            parse_volumes_response("<html>"),
            Err(LookupError::Parse(_))
        ));
    }

    #[test]
    fn partial_dates_yield_year() {
        assert_eq!(parse_year("1937"), Some(1937));
        assert_eq!(parse_year("1937-09"), Some(1937));
        assert_eq!(parse_year("1937-09-21"), Some(1937));
        assert_eq!(parse_year("autumn"), None);
    }

    #[test]
    fn builds_volume_draft() {
        let volume = parse_volumes_response(HOBBIT)
            .unwrap()
            .unwrap()
            .into_volume(UNSAVED_ID);
        assert_eq!(volume.id, UNSAVED_ID);
        assert_eq!(volume.name, "The Hobbit: or There and Back Again");
        assert_eq!(volume.copyright.as_deref(), Some("2009"));
        assert_eq!(volume.isbn.as_deref(), Some("9780007322602"));
        assert!(volume.active);
    }
}
