use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;

use crate::error::AppResult;

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("no TMDB_ACCESS_TOKEN provided, credit ingestion is disabled");
        }

        let per_second = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));
        Self { client, access_token, base_url, limiter }
    }

    pub fn is_mock(&self) -> bool {
        self.access_token.trim().is_empty()
    }

    pub async fn get_movie_credits(&self, tmdb_id: i32) -> AppResult<MovieCredits> {
        if self.is_mock() {
            return Ok(MovieCredits::default());
        }

        self.limiter.until_ready().await;

        let url = format!("{}/movie/{}/credits", self.base_url.trim_end_matches('/'), tmdb_id);

        let credits: MovieCredits = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(credits)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
pub struct CastMember {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
    pub gender: Option<i32>,
    pub character: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CrewMember {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
    pub gender: Option<i32>,
    pub job: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_credits_payload() {
        let body = r#"{
            "id": 550,
            "cast": [
                {"id": 819, "name": "Edward Norton", "profile_path": "/a.jpg", "gender": 2,
                 "character": "The Narrator", "order": 0}
            ],
            "crew": [
                {"id": 7467, "name": "David Fincher", "profile_path": null, "gender": 2,
                 "job": "Director", "department": "Directing"}
            ]
        }"#;

        let credits: MovieCredits = serde_json::from_str(body).unwrap();
        assert_eq!(credits.cast[0].name, "Edward Norton");
        assert_eq!(credits.cast[0].order, Some(0));
        assert_eq!(credits.crew[0].job, "Director");
    }

    #[tokio::test]
    async fn mock_client_returns_no_credits() {
        let client = TmdbClient::new(reqwest::Client::new(), String::new(), String::new(), 0);
        assert!(client.is_mock());
        let credits = client.get_movie_credits(550).await.unwrap();
        assert!(credits.cast.is_empty() && credits.crew.is_empty());
    }
}
