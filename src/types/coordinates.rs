use std::fmt;
use std::fmt::{Display, Formatter};

/// A geographical coordinate in decimal degrees.
///
/// Produced by [`crate::LocationResolver`] from a free-text place name and consumed by
/// [`crate::ObservationFetcher`] to find the weather stations around it.
///
/// # Examples
///
/// ```
/// use temp_ingester::Coordinates;
///
/// let london = Coordinates::new(51.5073, -0.1276);
/// assert_eq!(london.latitude, 51.5073);
/// assert_eq!(london.longitude, -0.1276);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude, positive for North.
    pub latitude: f64,
    /// Longitude, positive for East.
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within the valid WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Display for Coordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}
