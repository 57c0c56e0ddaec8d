//! Core library for the `ukweather` tools.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - Coordinate validation and the forecast document model
//! - The Met Office DataHub client behind the [`ForecastSource`] seam
//! - Error classification into user-facing messages
//! - Markdown / JSON rendering under a global size cap
//! - The hourly, three-hourly and daily forecast operations
//!
//! It is used by `ukweather-cli`, but can also be embedded in a tool-calling
//! host through [`ForecastService`] and [`tools::tool_descriptors`].

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod provider;
pub mod render;
pub mod service;
pub mod tools;
pub mod weather_code;

pub use config::{ApiKey, Config};
pub use document::{ForecastDocument, Parameter, ParameterValue, TimeStep};
pub use error::{CoordinateError, ErrorKind, FetchError};
pub use model::{Coordinate, ForecastRequest, Granularity, ResponseFormat};
pub use provider::{ForecastSource, metoffice::MetOfficeClient};
pub use render::{CHARACTER_LIMIT, TruncationMarker};
pub use service::{ForecastService, ToolCallError};
