//! Thumbnail size policy.
//!
//! All functions here are pure. The same inputs always produce the same
//! ordered list, which is what lets link advertising and request validation
//! agree without sharing any state.

use std::str::FromStr;

use lb_core::Error;
use serde::Serialize;

/// A thumbnail size a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ThumbnailSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses the `{width}x{height}` path segment.
impl FromStr for ThumbnailSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validation(format!("invalid thumbnail size: {s}"));
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let width = w.parse().map_err(|_| invalid())?;
        let height = h.parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

/// Derive the thumbnail sizes available for an original of
/// `width`x`height`, largest first.
///
/// Both edges are halved together (so aspect ratio is kept) for as long as
/// each stays at or above `min_size`. The original size itself is never
/// included, and the list is empty when the first halving already drops
/// below the floor. A `min_size` of zero is treated as one.
///
/// # Examples
/// ```
/// # use lb_imaging::policy::{derive, ThumbnailSpec};
/// assert_eq!(
///     derive(462, 462, 100),
///     vec![ThumbnailSpec::new(231, 231), ThumbnailSpec::new(115, 115)]
/// );
/// ```
pub fn derive(width: u32, height: u32, min_size: u32) -> Vec<ThumbnailSpec> {
    let floor = min_size.max(1);
    (1..u32::BITS)
        .map(|shift| ThumbnailSpec::new(width >> shift, height >> shift))
        .take_while(|spec| spec.width >= floor && spec.height >= floor)
        .collect()
}

/// True when `spec` is one of the sizes [`derive`] yields.
pub fn is_valid(width: u32, height: u32, min_size: u32, spec: ThumbnailSpec) -> bool {
    derive(width, height, min_size).contains(&spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_original() {
        assert_eq!(
            derive(462, 462, 100),
            vec![ThumbnailSpec::new(231, 231), ThumbnailSpec::new(115, 115)]
        );
    }

    #[test]
    fn non_power_of_two_size_is_invalid() {
        assert!(!is_valid(462, 462, 100, ThumbnailSpec::new(200, 200)));
        assert!(is_valid(462, 462, 100, ThumbnailSpec::new(115, 115)));
    }

    #[test]
    fn original_size_is_never_offered() {
        assert!(!is_valid(462, 462, 1, ThumbnailSpec::new(462, 462)));
    }

    #[test]
    fn larger_than_original_is_invalid() {
        assert!(!is_valid(462, 462, 100, ThumbnailSpec::new(924, 924)));
    }

    #[test]
    fn first_halving_below_floor_is_empty() {
        assert!(derive(150, 150, 100).is_empty());
        assert!(derive(0, 0, 1).is_empty());
    }

    #[test]
    fn landscape_stops_on_short_edge() {
        assert_eq!(
            derive(1000, 300, 64),
            vec![ThumbnailSpec::new(500, 150), ThumbnailSpec::new(250, 75)]
        );
    }

    #[test]
    fn zero_floor_terminates() {
        let specs = derive(8, 8, 0);
        assert_eq!(
            specs,
            vec![
                ThumbnailSpec::new(4, 4),
                ThumbnailSpec::new(2, 2),
                ThumbnailSpec::new(1, 1)
            ]
        );
    }

    #[test]
    fn properties_hold_across_inputs() {
        for &(w, h) in &[(1, 1), (63, 640), (4000, 3000), (u32::MAX, 17), (1023, 1025)] {
            for &min in &[1, 16, 64, 100, 1000] {
                let specs = derive(w, h, min);
                assert_eq!(specs, derive(w, h, min), "derive must be deterministic");

                for (k, spec) in specs.iter().enumerate() {
                    let shift = k as u32 + 1;
                    assert!(spec.width >= min && spec.height >= min);
                    assert_eq!(spec.width, w >> shift);
                    assert_eq!(spec.height, h >> shift);
                }
                for pair in specs.windows(2) {
                    assert!(pair[1].width < pair[0].width);
                    assert!(pair[1].height < pair[0].height);
                }
            }
        }
    }

    #[test]
    fn parse_size_segment() {
        assert_eq!(
            "231x115".parse::<ThumbnailSpec>().unwrap(),
            ThumbnailSpec::new(231, 115)
        );
        assert!("231".parse::<ThumbnailSpec>().is_err());
        assert!("ax1".parse::<ThumbnailSpec>().is_err());
        assert!("-1x5".parse::<ThumbnailSpec>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        let spec = ThumbnailSpec::new(640, 480);
        assert_eq!(spec.to_string().parse::<ThumbnailSpec>().unwrap(), spec);
    }
}
