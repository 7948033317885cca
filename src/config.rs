use std::net::SocketAddr;

use anyhow::Context;
use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::clock::Deadline;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub nominations_deadline: Deadline,
    pub new_release_min_year: i32,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movie_awards.db?mode=rwc".to_string());

        let nominations_deadline =
            parse_deadline(std::env::var("NOMINATIONS_DEADLINE").ok().as_deref())
                .context("NOMINATIONS_DEADLINE")?;

        let current_year = i32::from(jiff::Zoned::now().year());
        let new_release_min_year: i32 = std::env::var("NEW_RELEASE_MIN_YEAR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(current_year - 1);

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            nominations_deadline,
            new_release_min_year,
            tmdb_access_token,
            tmdb_base_url,
            tmdb_rps,
        })
    }
}

/// Parses a `DD/MM/YYYY` deadline as midnight UTC. Unset means nominations
/// stay open until 2099.
pub fn parse_deadline(raw: Option<&str>) -> anyhow::Result<Deadline> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Deadline(midnight_utc(Date::new(2099, 1, 1)?)?));
    };

    let parts: Vec<&str> = raw.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        anyhow::bail!("expected DD/MM/YYYY, got {raw:?}");
    };

    let date = Date::new(
        year.parse().context("year")?,
        month.parse().context("month")?,
        day.parse().context("day")?,
    )
    .with_context(|| format!("invalid date {raw:?}"))?;

    Ok(Deadline(midnight_utc(date)?))
}

fn midnight_utc(date: Date) -> anyhow::Result<Timestamp> {
    Ok(date.to_zoned(TimeZone::UTC)?.timestamp())
}
