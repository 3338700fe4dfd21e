mod nasa;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::Apod;

pub use nasa::NasaClient;

/// Remote source of picture-of-the-day records. The production
/// implementation is [`NasaClient`]; tests substitute fakes.
#[async_trait]
pub trait ApodRemote: Send + Sync + 'static {
    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Apod>;
    async fn fetch_batch(&self, count: usize) -> Result<Vec<Apod>>;
}
