use crate::{Coordinate, ForecastDocument, Granularity, error::FetchError};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod metoffice;

/// Upstream of forecast documents. One call performs at most one request.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        granularity: Granularity,
    ) -> Result<ForecastDocument, FetchError>;
}

#[async_trait]
impl<T: ForecastSource + ?Sized> ForecastSource for Arc<T> {
    async fn fetch(
        &self,
        coordinate: Coordinate,
        granularity: Granularity,
    ) -> Result<ForecastDocument, FetchError> {
        (**self).fetch(coordinate, granularity).await
    }
}
