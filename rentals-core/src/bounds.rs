//! Inclusive price and geographic bounds used by the cleaning transform.

use geo::{Coord, Intersects, Rect};
use thiserror::Error;

/// Western edge of the default listing region, in degrees.
pub const NYC_MIN_LONGITUDE: f64 = -74.25;
/// Eastern edge of the default listing region, in degrees.
pub const NYC_MAX_LONGITUDE: f64 = -73.50;
/// Southern edge of the default listing region, in degrees.
pub const NYC_MIN_LATITUDE: f64 = 40.5;
/// Northern edge of the default listing region, in degrees.
pub const NYC_MAX_LATITUDE: f64 = 41.2;

/// Errors returned when bounds are inconsistent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    /// A bound was NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite {
        /// Name of the offending bound.
        field: &'static str,
        /// Supplied value.
        value: f64,
    },
    /// The lower bound exceeds the upper bound.
    #[error("{lower_field} ({lower}) must not exceed {upper_field} ({upper})")]
    Inverted {
        /// Name of the lower bound.
        lower_field: &'static str,
        /// Supplied lower bound.
        lower: f64,
        /// Name of the upper bound.
        upper_field: &'static str,
        /// Supplied upper bound.
        upper: f64,
    },
}

fn check_range(
    (lower_field, lower): (&'static str, f64),
    (upper_field, upper): (&'static str, f64),
) -> Result<(), BoundsError> {
    for (field, value) in [(lower_field, lower), (upper_field, upper)] {
        if !value.is_finite() {
            return Err(BoundsError::NonFinite { field, value });
        }
    }
    if lower > upper {
        return Err(BoundsError::Inverted {
            lower_field,
            lower,
            upper_field,
            upper,
        });
    }
    Ok(())
}

/// Inclusive `[min, max]` price range.
///
/// # Examples
///
/// ```
/// use rentals_core::PriceBounds;
///
/// # fn main() -> Result<(), rentals_core::BoundsError> {
/// let bounds = PriceBounds::new(10.0, 350.0)?;
/// assert!(bounds.contains(10.0));
/// assert!(!bounds.contains(350.5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    min: f64,
    max: f64,
}

impl PriceBounds {
    /// Validate and construct a price range.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] when either bound is not finite or `min` exceeds
    /// `max`.
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        check_range(("min_price", min), ("max_price", max))?;
        Ok(Self { min, max })
    }

    /// Lowest accepted price.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Highest accepted price.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Report whether `price` lies inside the range, boundaries included.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        (self.min..=self.max).contains(&price)
    }
}

/// Axis-aligned longitude/latitude box, boundaries included.
///
/// Coordinates are WGS84 degrees with `x = longitude` and `y = latitude`.
/// The default is the fixed New York City box used by the listing dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    rect: Rect<f64>,
}

impl GeoBounds {
    /// Validate and construct a box from its south-west and north-east corners.
    ///
    /// Corners are not reordered: a west edge east of the east edge is an
    /// error rather than a silently swapped box.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] when a coordinate is not finite or a south-west
    /// edge lies beyond its north-east counterpart.
    pub fn new(south_west: Coord<f64>, north_east: Coord<f64>) -> Result<Self, BoundsError> {
        check_range(
            ("min_longitude", south_west.x),
            ("max_longitude", north_east.x),
        )?;
        check_range(
            ("min_latitude", south_west.y),
            ("max_latitude", north_east.y),
        )?;
        Ok(Self {
            rect: Rect::new(south_west, north_east),
        })
    }

    /// The default New York City box.
    #[must_use]
    pub fn nyc() -> Self {
        Self {
            rect: Rect::new(
                Coord {
                    x: NYC_MIN_LONGITUDE,
                    y: NYC_MIN_LATITUDE,
                },
                Coord {
                    x: NYC_MAX_LONGITUDE,
                    y: NYC_MAX_LATITUDE,
                },
            ),
        }
    }

    /// Underlying rectangle.
    #[must_use]
    pub const fn rect(&self) -> Rect<f64> {
        self.rect
    }

    /// Report whether the point lies inside the box, boundaries included.
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        if !(longitude.is_finite() && latitude.is_finite()) {
            return false;
        }
        self.rect.intersects(&Coord {
            x: longitude,
            y: latitude,
        })
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::nyc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10.0, 10.0)]
    #[case(0.0, 500.0)]
    fn price_bounds_accept_ordered_ranges(#[case] min: f64, #[case] max: f64) {
        assert!(PriceBounds::new(min, max).is_ok());
    }

    #[rstest]
    fn price_bounds_reject_inverted_range() {
        let err = PriceBounds::new(500.0, 10.0).expect_err("inverted");
        assert!(matches!(
            err,
            BoundsError::Inverted {
                lower_field: "min_price",
                upper_field: "max_price",
                ..
            }
        ));
    }

    #[rstest]
    #[case(f64::NAN, 10.0, "min_price")]
    #[case(0.0, f64::INFINITY, "max_price")]
    fn price_bounds_reject_non_finite(
        #[case] min: f64,
        #[case] max: f64,
        #[case] expected: &'static str,
    ) {
        match PriceBounds::new(min, max) {
            Err(BoundsError::NonFinite { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }

    #[rstest]
    #[case(NYC_MIN_LONGITUDE, NYC_MIN_LATITUDE)] // south-west corner
    #[case(NYC_MAX_LONGITUDE, NYC_MAX_LATITUDE)] // north-east corner
    #[case(-73.9, 40.8)] // midtown
    fn nyc_box_includes_boundaries(#[case] longitude: f64, #[case] latitude: f64) {
        assert!(GeoBounds::nyc().contains(longitude, latitude));
    }

    #[rstest]
    #[case(-74.2500001, 40.8)]
    #[case(-73.4999999, 40.8)]
    #[case(-73.9, 40.4999999)]
    #[case(-73.9, 41.2000001)]
    #[case(-70.0, 40.8)]
    #[case(f64::NAN, 40.8)]
    fn nyc_box_excludes_outside_points(#[case] longitude: f64, #[case] latitude: f64) {
        assert!(!GeoBounds::nyc().contains(longitude, latitude));
    }

    #[rstest]
    fn geo_bounds_reject_swapped_corners() {
        let err = GeoBounds::new(Coord { x: -73.5, y: 40.5 }, Coord { x: -74.25, y: 41.2 })
            .expect_err("west edge east of east edge");
        assert!(matches!(
            err,
            BoundsError::Inverted {
                lower_field: "min_longitude",
                ..
            }
        ));
    }

    #[rstest]
    fn default_geo_bounds_match_nyc() {
        assert_eq!(GeoBounds::default(), GeoBounds::nyc());
    }
}
