use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{FetchError, VACANCY_PAGE_SIZE, VacancySource};
use crate::models::employer::EmployerRecord;
use crate::models::vacancy::VacancyRecord;

/// Client for the hh.ru public API.
pub struct HhClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct VacancyPage {
    items: Vec<VacancyRecord>,
}

impl HhClient {
    /// `timeout` bounds a whole request; `connect_timeout` only the TCP and TLS setup.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, FetchError> {
        tracing::debug!("GET {url} {query:?}");
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl VacancySource for HhClient {
    async fn fetch_employer(&self, employer_id: &str) -> Result<EmployerRecord, FetchError> {
        let url = format!("{}/employers/{employer_id}", self.base_url);
        let employer = self.get(&url, &[]).await?.json().await?;
        Ok(employer)
    }

    async fn fetch_vacancies(&self, employer_id: &str) -> Result<Vec<VacancyRecord>, FetchError> {
        let url = format!("{}/vacancies", self.base_url);
        let query = [
            ("employer_id", employer_id.to_string()),
            ("per_page", VACANCY_PAGE_SIZE.to_string()),
        ];
        let page: VacancyPage = self.get(&url, &query).await?.json().await?;
        Ok(page.items)
    }
}
