use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Apod, ApodResponse};

use super::ApodRemote;

const NASA_API_URL: &str = "https://api.nasa.gov/planetary/apod";

pub struct NasaClient {
    client: Client,
    api_key: String,
}

impl NasaClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("skygaze/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_key }
    }

    async fn get(&self, extra: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut query: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
        query.extend_from_slice(extra);

        let response = self
            .client
            .get(NASA_API_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::Network(e.to_string())
                } else {
                    AppError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ApodRemote for NasaClient {
    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Apod> {
        let response = self
            .get(&[("date", date.format("%Y-%m-%d").to_string())])
            .await?;

        let body: ApodResponse = response.json().await?;
        body.into_domain().ok_or(AppError::EmptyResponse)
    }

    async fn fetch_batch(&self, count: usize) -> Result<Vec<Apod>> {
        let response = self.get(&[("count", count.to_string())]).await?;

        let body: Vec<ApodResponse> = response.json().await?;
        let apods: Vec<Apod> = body
            .into_iter()
            .filter_map(|r| {
                let apod = r.into_domain();
                if apod.is_none() {
                    tracing::debug!("Dropping APOD record without a date");
                }
                apod
            })
            .collect();

        tracing::debug!("Fetched {} of {} requested records", apods.len(), count);
        Ok(apods)
    }
}
