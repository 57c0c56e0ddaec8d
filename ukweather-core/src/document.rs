//! The DataHub site-specific forecast document.
//!
//! Only the fields the pipeline reads are typed; everything else (parameter
//! metadata, location name, model run date, ...) is kept verbatim in `extra`
//! so that serializing a document reproduces what the upstream sent.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::{collections::BTreeMap, fmt};

use crate::model::Granularity;

/// GeoJSON `FeatureCollection` returned by the point endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude, altitude?]`, kept as wire numbers so `47` stays `47`.
    pub coordinates: Vec<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(rename = "timeSeries")]
    pub time_series: Vec<TimeStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One forecast period. Parameter values stay in their wire form; use
/// [`TimeStep::parameters`] for the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    pub time: Timestamp,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

/// UTC instant that re-serializes to the exact text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        parse_datetime(raw).map(|instant| Self {
            raw: raw.to_string(),
            instant,
        })
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.format("%Y-%m-%dT%H:%MZ").to_string(),
            instant,
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// DataHub timestamps look like `2024-01-15T14:00Z`; RFC 3339 is accepted too.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Weather quantities the renderer knows how to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    Temperature,
    MinTemperature,
    FeelsLike,
    WindSpeed,
    WindDirection,
    WindGust,
    Precipitation,
    PrecipitationProbability,
    Humidity,
    Visibility,
    Pressure,
    UvIndex,
    WeatherCode,
}

impl Parameter {
    /// Rendering order.
    pub const fn all() -> &'static [Parameter] {
        &[
            Parameter::Temperature,
            Parameter::MinTemperature,
            Parameter::FeelsLike,
            Parameter::WindSpeed,
            Parameter::WindDirection,
            Parameter::WindGust,
            Parameter::Precipitation,
            Parameter::PrecipitationProbability,
            Parameter::Humidity,
            Parameter::Visibility,
            Parameter::Pressure,
            Parameter::UvIndex,
            Parameter::WeatherCode,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::MinTemperature => "Min Temperature",
            Parameter::FeelsLike => "Feels Like",
            Parameter::WindSpeed => "Wind Speed",
            Parameter::WindDirection => "Wind Direction",
            Parameter::WindGust => "Wind Gust",
            Parameter::Precipitation => "Precipitation",
            Parameter::PrecipitationProbability => "Chance of Precipitation",
            Parameter::Humidity => "Humidity",
            Parameter::Visibility => "Visibility",
            Parameter::Pressure => "Pressure",
            Parameter::UvIndex => "UV Index",
            Parameter::WeatherCode => "Weather",
        }
    }

    /// Unit suffix as published by the DataHub (SI, no conversion).
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature | Parameter::MinTemperature | Parameter::FeelsLike => "°C",
            Parameter::WindSpeed | Parameter::WindGust => "m/s",
            Parameter::WindDirection => "°",
            Parameter::Precipitation => "mm",
            Parameter::PrecipitationProbability | Parameter::Humidity => "%",
            Parameter::Visibility => "m",
            Parameter::Pressure => "Pa",
            Parameter::UvIndex | Parameter::WeatherCode => "",
        }
    }

    /// Field name carrying this parameter at `granularity`, or `None` when that
    /// endpoint does not publish it.
    pub fn wire_key(&self, granularity: Granularity) -> Option<&'static str> {
        use Granularity::{Daily, Hourly, ThreeHourly};

        let key = match (self, granularity) {
            (Parameter::Temperature, Hourly) => "screenTemperature",
            (Parameter::Temperature, ThreeHourly) => "maxScreenAirTemp",
            (Parameter::Temperature, Daily) => "dayMaxScreenTemperature",
            (Parameter::MinTemperature, Hourly | ThreeHourly) => "minScreenAirTemp",
            (Parameter::MinTemperature, Daily) => "nightMinScreenTemperature",
            (Parameter::FeelsLike, Hourly) => "feelsLikeTemperature",
            (Parameter::FeelsLike, ThreeHourly) => "feelsLikeTemp",
            (Parameter::FeelsLike, Daily) => "dayMaxFeelsLikeTemp",
            (Parameter::WindSpeed, Hourly | ThreeHourly) => "windSpeed10m",
            (Parameter::WindSpeed, Daily) => "midday10MWindSpeed",
            (Parameter::WindDirection, Hourly | ThreeHourly) => "windDirectionFrom10m",
            (Parameter::WindDirection, Daily) => "midday10MWindDirection",
            (Parameter::WindGust, Hourly | ThreeHourly) => "windGustSpeed10m",
            (Parameter::WindGust, Daily) => "midday10MWindGust",
            (Parameter::Precipitation, Hourly | ThreeHourly) => "totalPrecipAmount",
            (Parameter::Precipitation, Daily) => return None,
            (Parameter::PrecipitationProbability, Hourly | ThreeHourly) => "probOfPrecipitation",
            (Parameter::PrecipitationProbability, Daily) => "dayProbabilityOfPrecipitation",
            (Parameter::Humidity, Hourly | ThreeHourly) => "screenRelativeHumidity",
            (Parameter::Humidity, Daily) => "middayRelativeHumidity",
            (Parameter::Visibility, Hourly | ThreeHourly) => "visibility",
            (Parameter::Visibility, Daily) => "middayVisibility",
            (Parameter::Pressure, Hourly | ThreeHourly) => "mslp",
            (Parameter::Pressure, Daily) => "middayMslp",
            (Parameter::UvIndex, Hourly | ThreeHourly) => "uvIndex",
            (Parameter::UvIndex, Daily) => "maxUvIndex",
            (Parameter::WeatherCode, Hourly | ThreeHourly) => "significantWeatherCode",
            (Parameter::WeatherCode, Daily) => "daySignificantWeatherCode",
        };

        Some(key)
    }
}

/// A numeric parameter value. Integers stay integers so they print as sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Integer(i64),
    Decimal(f64),
}

impl ParameterValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(ParameterValue::Integer)
                .or_else(|| n.as_f64().map(ParameterValue::Decimal)),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(v) => Some(*v),
            ParameterValue::Decimal(v) if v.fract() == 0.0 => Some(*v as i64),
            ParameterValue::Decimal(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(v) => write!(f, "{v}"),
            ParameterValue::Decimal(v) => write!(f, "{v}"),
        }
    }
}

/// Typed view of one step at a given granularity. A parameter the endpoint
/// publishes maps to `Some(value)` or `None` when missing at this step;
/// parameters the endpoint never publishes are not keys at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet(BTreeMap<Parameter, Option<ParameterValue>>);

impl ParameterSet {
    /// `Some(None)` means applicable but absent.
    pub fn get(&self, parameter: Parameter) -> Option<Option<ParameterValue>> {
        self.0.get(&parameter).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, Option<ParameterValue>)> + '_ {
        self.0.iter().map(|(parameter, value)| (*parameter, *value))
    }
}

impl TimeStep {
    pub fn parameters(&self, granularity: Granularity) -> ParameterSet {
        let map = Parameter::all()
            .iter()
            .filter_map(|parameter| {
                let key = parameter.wire_key(granularity)?;
                let value = self.values.get(key).and_then(ParameterValue::from_json);
                Some((*parameter, value))
            })
            .collect();

        ParameterSet(map)
    }
}

impl ForecastDocument {
    pub fn first_feature(&self) -> Option<&Feature> {
        self.features.first()
    }

    /// Steps across all features. Point forecasts carry exactly one feature.
    pub fn total_steps(&self) -> usize {
        self.features
            .iter()
            .map(|feature| feature.properties.time_series.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_steps() == 0
    }

    /// Copy keeping only the first `steps` entries of every time series.
    pub fn truncated(&self, steps: usize) -> ForecastDocument {
        let mut copy = self.clone();
        for feature in &mut copy.features {
            feature.properties.time_series.truncate(steps);
        }
        copy
    }
}

impl Feature {
    pub fn latitude(&self) -> Option<f64> {
        self.geometry.coordinates.get(1).and_then(Number::as_f64)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.geometry.coordinates.first().and_then(Number::as_f64)
    }

    pub fn location_name(&self) -> Option<&str> {
        self.properties
            .extra
            .get("location")
            .and_then(|location| location.get("name"))
            .and_then(Value::as_str)
    }

    pub fn model_run_date(&self) -> Option<&str> {
        self.properties
            .extra
            .get("modelRunDate")
            .and_then(Value::as_str)
    }
}
