//! The three public forecast operations.
//!
//! All of them run the same pipeline (validate, fetch, classify or render) and
//! differ only in the [`Granularity`] they pass along.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    error::ErrorKind,
    model::{Coordinate, ForecastRequest, Granularity, ResponseFormat},
    provider::ForecastSource,
    render,
    tools::ForecastArgs,
};

/// A tool call the host should reject before it becomes a tool result.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ForecastService<S> {
    source: S,
}

impl<S: ForecastSource> ForecastService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run one request through fetch and render.
    #[instrument(skip(self), fields(granularity = %request.granularity, format = %request.format))]
    pub async fn forecast(&self, request: ForecastRequest) -> Result<String, ErrorKind> {
        let document = self
            .source
            .fetch(request.coordinate, request.granularity)
            .await
            .map_err(|failure| ErrorKind::classify(&failure))?;

        let rendered = render::render(&document, request.granularity, request.format).map_err(
            |err| {
                warn!(error = %err, "failed to serialize forecast document");
                ErrorKind::UpstreamMalformedResponse
            },
        )?;

        info!(chars = rendered.chars().count(), "forecast rendered");
        Ok(rendered)
    }

    /// Validate, fetch and render; failures come back as an `Error: ` string.
    pub async fn run(
        &self,
        granularity: Granularity,
        latitude: f64,
        longitude: f64,
        format: ResponseFormat,
    ) -> String {
        let coordinate = match Coordinate::new(latitude, longitude) {
            Ok(coordinate) => coordinate,
            Err(err) => return ErrorKind::from(err).user_message(),
        };

        let request = ForecastRequest::new(coordinate, granularity).with_format(format);
        match self.forecast(request).await {
            Ok(rendered) => rendered,
            Err(kind) => kind.user_message(),
        }
    }

    pub async fn get_hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        format: ResponseFormat,
    ) -> String {
        self.run(Granularity::Hourly, latitude, longitude, format).await
    }

    pub async fn get_three_hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        format: ResponseFormat,
    ) -> String {
        self.run(Granularity::ThreeHourly, latitude, longitude, format).await
    }

    pub async fn get_daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        format: ResponseFormat,
    ) -> String {
        self.run(Granularity::Daily, latitude, longitude, format).await
    }

    /// Dispatch a host tool call by registered name with JSON arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolCallError> {
        let granularity = Granularity::from_tool_name(name)
            .ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?;

        let args: ForecastArgs =
            serde_json::from_value(arguments).map_err(|source| ToolCallError::InvalidArguments {
                tool: granularity.tool_name(),
                source,
            })?;

        Ok(self
            .run(granularity, args.latitude, args.longitude, args.response_format)
            .await)
    }
}
