use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::CoordinateError;

/// A validated WGS84 point. Only constructible through [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
    pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

    /// Range-check both axes. Latitude is checked first; NaN fails either axis.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let (lat_min, lat_max) = Self::LATITUDE_RANGE;
        if !(lat_min..=lat_max).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange { value: latitude });
        }

        let (lon_min, lon_max) = Self::LONGITUDE_RANGE;
        if !(lon_min..=lon_max).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange { value: longitude });
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Forecast time resolution. Each one is a distinct upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hourly,
    ThreeHourly,
    Daily,
}

impl Granularity {
    pub const fn all() -> &'static [Granularity] {
        &[Granularity::Hourly, Granularity::ThreeHourly, Granularity::Daily]
    }

    /// Path segment appended to the point endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::ThreeHourly => "three-hourly",
            Granularity::Daily => "daily",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Hourly => "Hourly",
            Granularity::ThreeHourly => "3-Hourly",
            Granularity::Daily => "Daily",
        }
    }

    /// Number of leading steps shown in Markdown. `None` shows the whole series;
    /// daily forecasts cover at most a week.
    pub fn markdown_step_limit(&self) -> Option<usize> {
        match self {
            Granularity::Hourly | Granularity::ThreeHourly => Some(20),
            Granularity::Daily => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Output format for tool responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Markdown => "markdown",
            ResponseFormat::Json => "json",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ResponseFormat::Markdown),
            "json" => Ok(ResponseFormat::Json),
            other => Err(format!(
                "Unknown response format '{other}'. Supported formats: markdown, json."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    pub granularity: Granularity,
    pub format: ResponseFormat,
}

impl ForecastRequest {
    pub fn new(coordinate: Coordinate, granularity: Granularity) -> Self {
        Self {
            coordinate,
            granularity,
            format: ResponseFormat::default(),
        }
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }
}
