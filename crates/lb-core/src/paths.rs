//! URI templates and timestamp formatting shared by the store and the server.
//!
//! Thumbnail links advertised in image documents and the thumbnail route must
//! agree on one template, so both sides build URIs here.

use chrono::{DateTime, Utc};

use crate::ImageId;

/// Collection URI for all images.
pub const IMAGES_URI: &str = "/images";

/// URI of the canonical original for `id`, e.g. `/images/{id}.jpeg`.
pub fn image_uri(id: &ImageId, extension: &str) -> String {
    format!("{IMAGES_URI}/{id}.{extension}")
}

/// URI of a thumbnail, e.g. `/thumbnails/{id}/231x231`.
pub fn thumbnail_uri(id: &ImageId, width: u32, height: u32) -> String {
    format!("/thumbnails/{id}/{width}x{height}")
}

/// Split `"{id}.{ext}"` into its id and optional extension.
pub fn split_file_name(file: &str) -> (&str, Option<&str>) {
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file, None),
    }
}

/// Format a timestamp as an RFC 7231 HTTP-date.
pub fn http_date(at: &DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_id() -> ImageId {
        "36562622-48e5-4a61-be67-e426b11821ed".parse().unwrap()
    }

    #[test]
    fn test_image_uri() {
        assert_eq!(
            image_uri(&fixed_id(), "jpeg"),
            "/images/36562622-48e5-4a61-be67-e426b11821ed.jpeg"
        );
    }

    #[test]
    fn test_thumbnail_uri() {
        assert_eq!(
            thumbnail_uri(&fixed_id(), 231, 115),
            "/thumbnails/36562622-48e5-4a61-be67-e426b11821ed/231x115"
        );
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("abc.jpeg"), ("abc", Some("jpeg")));
        assert_eq!(split_file_name("abc"), ("abc", None));
        assert_eq!(split_file_name(".hidden"), (".hidden", None));
    }

    #[test]
    fn test_http_date() {
        let at = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(&at), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
