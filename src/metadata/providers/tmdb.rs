//! TMDB (The Movie Database) identity resolver and image fetcher.
//!
//! Implements [`IdentityResolver`] and [`ImageFetcher`] on top of the TMDB v3
//! REST API using a blocking client; the scan passes run on plain worker
//! threads.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Confidence scoring based on title similarity and year proximity.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use libscraper_common::MediaType;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::TmdbConfig;
use crate::metadata::provider::{
    IdentityResolver, ImageFetcher, ImageInfo, MediaIdentity, MediaImages,
};
use crate::scanner::NameGuess;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const REQUESTS_PER_SECOND: u32 = 4;
/// Search hits scoring below this are treated as no match.
const MIN_CONFIDENCE: f64 = 0.2;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvSearchResult {
    id: u64,
    name: Option<String>,
    original_name: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetail {
    id: u64,
    name: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
    external_ids: Option<TmdbExternalIds>,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbImagesResponse {
    posters: Option<Vec<TmdbImage>>,
    backdrops: Option<Vec<TmdbImage>>,
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
    width: u32,
    height: u32,
    iso_639_1: Option<String>,
    vote_average: f64,
}

/// A scored search hit.
#[derive(Debug, Clone)]
struct Candidate {
    id: u64,
    confidence: f64,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB identity resolver and image fetcher.
///
/// # Examples
///
/// ```no_run
/// use libscraper::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "zh-CN".into()).unwrap();
/// ```
pub struct TmdbProvider {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl TmdbProvider {
    /// Create a provider against the public TMDB endpoints.
    ///
    /// The `language` parameter should be a tag such as `"zh-CN"`.
    pub fn new(api_key: String, language: String) -> anyhow::Result<Self> {
        Self::from_config(&TmdbConfig {
            api_key,
            language,
            ..TmdbConfig::default()
        })
    }

    /// Create a provider from the `[tmdb]` config section.
    pub fn from_config(config: &TmdbConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// Returns `true` when an API key is configured.
    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    ///
    /// Returns `Ok(None)` for 404 so that unknown ids resolve to nothing.
    fn get(&self, path: &str, extra_params: &[(&str, &str)]) -> anyhow::Result<Option<Response>> {
        let url = format!("{}{path}", self.base_url);
        let mut params: Vec<(&str, &str)> =
            vec![("api_key", self.api_key.as_str()), ("language", self.language.as_str())];
        params.extend_from_slice(extra_params);

        let mut retries = 0u32;
        loop {
            futures::executor::block_on(self.rate_limiter.until_ready());

            let resp = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .with_context(|| format!("TMDB request failed: {path}"))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                std::thread::sleep(Duration::from_secs(wait));
                continue;
            }

            if resp.status() == StatusCode::NOT_FOUND {
                debug!(path = path, "TMDB returned 404");
                return Ok(None);
            }

            let resp = resp
                .error_for_status()
                .with_context(|| format!("TMDB request returned error: {path}"))?;

            return Ok(Some(resp));
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_params: &[(&str, &str)],
    ) -> anyhow::Result<Option<T>> {
        match self.get(path, extra_params)? {
            Some(resp) => {
                let body = resp
                    .json()
                    .with_context(|| format!("failed to parse TMDB response: {path}"))?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    /// Compute confidence score for a search result based on title similarity
    /// and year proximity.
    fn confidence(
        query_title: &str,
        result_title: &str,
        query_year: Option<u16>,
        result_year: Option<u16>,
    ) -> f64 {
        let base = if query_title == result_title {
            0.5
        } else if query_title.eq_ignore_ascii_case(result_title) {
            0.4
        } else if result_title
            .to_lowercase()
            .contains(&query_title.to_lowercase())
        {
            0.2
        } else {
            0.1
        };

        let year_bonus = match (query_year, result_year) {
            (Some(q), Some(r)) if q == r => 0.3,
            (Some(q), Some(r)) if q.abs_diff(r) <= 1 => 0.15,
            _ => 0.0,
        };

        base + year_bonus
    }

    /// Score against both the localised and the original title.
    fn best_confidence(
        query_title: &str,
        titles: [Option<&str>; 2],
        query_year: Option<u16>,
        result_year: Option<u16>,
    ) -> f64 {
        titles
            .iter()
            .flatten()
            .map(|t| Self::confidence(query_title, t, query_year, result_year))
            .fold(0.0, f64::max)
    }

    fn search_movie(&self, title: &str, year: Option<u16>) -> anyhow::Result<Vec<Candidate>> {
        let mut params = vec![("query", title)];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("year", y.as_str()));
        }
        debug!(title = title, year = ?year, "TMDB search movie");

        let body: Option<TmdbSearchResponse<TmdbMovieSearchResult>> =
            self.get_json("/search/movie", &params)?;

        Ok(rank(body.map(|b| b.results).unwrap_or_default().into_iter().map(|r| {
            let result_year = parse_year(&r.release_date);
            Candidate {
                id: r.id,
                confidence: Self::best_confidence(
                    title,
                    [r.title.as_deref(), r.original_title.as_deref()],
                    year,
                    result_year,
                ),
            }
        })))
    }

    fn search_tv(&self, title: &str, year: Option<u16>) -> anyhow::Result<Vec<Candidate>> {
        debug!(title = title, "TMDB search TV");

        let body: Option<TmdbSearchResponse<TmdbTvSearchResult>> =
            self.get_json("/search/tv", &[("query", title)])?;

        Ok(rank(body.map(|b| b.results).unwrap_or_default().into_iter().map(|r| {
            let result_year = parse_year(&r.first_air_date);
            Candidate {
                id: r.id,
                confidence: Self::best_confidence(
                    title,
                    [r.name.as_deref(), r.original_name.as_deref()],
                    year,
                    result_year,
                ),
            }
        })))
    }

    fn movie_detail(&self, tmdb_id: u64) -> anyhow::Result<Option<MediaIdentity>> {
        let detail: Option<TmdbMovieDetail> =
            self.get_json(&format!("/movie/{tmdb_id}"), &[])?;

        Ok(detail.map(|d| MediaIdentity {
            tmdb_id: d.id,
            media_type: MediaType::Movie,
            title: d.title.unwrap_or_default(),
            original_title: d.original_title,
            year: parse_year(&d.release_date),
            overview: d.overview,
            imdb_id: d.imdb_id,
            images: MediaImages::default(),
        }))
    }

    fn tv_detail(&self, tmdb_id: u64) -> anyhow::Result<Option<MediaIdentity>> {
        let detail: Option<TmdbTvDetail> = self.get_json(
            &format!("/tv/{tmdb_id}"),
            &[("append_to_response", "external_ids")],
        )?;

        Ok(detail.map(|d| MediaIdentity {
            tmdb_id: d.id,
            media_type: MediaType::Tv,
            title: d.name.unwrap_or_default(),
            original_title: d.original_name,
            year: parse_year(&d.first_air_date),
            overview: d.overview,
            imdb_id: d.external_ids.and_then(|e| e.imdb_id),
            images: MediaImages::default(),
        }))
    }

    fn detail(&self, tmdb_id: u64, media_type: MediaType) -> anyhow::Result<Option<MediaIdentity>> {
        match media_type {
            MediaType::Movie => self.movie_detail(tmdb_id),
            MediaType::Tv => self.tv_detail(tmdb_id),
            MediaType::Unknown => match self.movie_detail(tmdb_id)? {
                Some(identity) => Ok(Some(identity)),
                None => self.tv_detail(tmdb_id),
            },
        }
    }

    fn image_url(&self, path: &str) -> String {
        format!("{}{path}", self.image_base_url)
    }

    fn to_image_info(&self, img: &TmdbImage) -> ImageInfo {
        ImageInfo {
            url: self.image_url(&img.file_path),
            width: img.width,
            height: img.height,
            language: img.iso_639_1.clone(),
            vote_average: img.vote_average,
        }
    }

    /// `include_image_language` value: the configured language, English,
    /// and language-neutral artwork.
    fn image_languages(&self) -> String {
        let primary = self.language.split('-').next().unwrap_or("en");
        if primary == "en" {
            "en,null".to_string()
        } else {
            format!("{primary},en,null")
        }
    }
}

impl IdentityResolver for TmdbProvider {
    fn resolve_by_id(
        &self,
        tmdb_id: &str,
        media_type: MediaType,
    ) -> anyhow::Result<Option<MediaIdentity>> {
        let Ok(id) = tmdb_id.trim().parse::<u64>() else {
            warn!(tmdb_id = tmdb_id, "Ignoring non-numeric TMDB id");
            return Ok(None);
        };

        let identity = self.detail(id, media_type)?;
        if let Some(ref identity) = identity {
            info!(
                tmdb_id = identity.tmdb_id,
                media_type = %identity.media_type,
                title = %identity.title,
                "Resolved by TMDB id"
            );
        }
        Ok(identity)
    }

    fn resolve_by_name(&self, guess: &NameGuess) -> anyhow::Result<Option<MediaIdentity>> {
        if guess.title.is_empty() {
            return Ok(None);
        }

        let kinds: &[MediaType] = match guess.media_type {
            MediaType::Movie => &[MediaType::Movie],
            MediaType::Tv => &[MediaType::Tv],
            MediaType::Unknown => &[MediaType::Movie, MediaType::Tv],
        };

        for &kind in kinds {
            let candidates = match kind {
                MediaType::Tv => self.search_tv(&guess.title, guess.year)?,
                _ => self.search_movie(&guess.title, guess.year)?,
            };

            let Some(top) = candidates.first() else {
                continue;
            };
            if top.confidence < MIN_CONFIDENCE {
                debug!(
                    title = %guess.title,
                    tmdb_id = top.id,
                    confidence = top.confidence,
                    "Top search result below confidence threshold"
                );
                continue;
            }

            info!(
                title = %guess.title,
                tmdb_id = top.id,
                confidence = top.confidence,
                media_type = %kind,
                "Selected top search result"
            );
            if let Some(identity) = self.detail(top.id, kind)? {
                return Ok(Some(identity));
            }
        }

        Ok(None)
    }
}

impl ImageFetcher for TmdbProvider {
    fn obtain_images(&self, identity: &mut MediaIdentity) -> anyhow::Result<()> {
        let kind = match identity.media_type {
            MediaType::Tv => "tv",
            _ => "movie",
        };
        let languages = self.image_languages();
        let resp: Option<TmdbImagesResponse> = self.get_json(
            &format!("/{kind}/{}/images", identity.tmdb_id),
            &[("include_image_language", languages.as_str())],
        )?;

        let Some(resp) = resp else {
            return Ok(());
        };

        let posters: Vec<ImageInfo> = resp
            .posters
            .unwrap_or_default()
            .iter()
            .map(|i| self.to_image_info(i))
            .collect();
        let backdrops: Vec<ImageInfo> = resp
            .backdrops
            .unwrap_or_default()
            .iter()
            .map(|i| self.to_image_info(i))
            .collect();

        identity.images = MediaImages {
            poster: best_image(&posters).map(|i| i.url.clone()),
            backdrop: best_image(&backdrops).map(|i| i.url.clone()),
        };
        debug!(tmdb_id = identity.tmdb_id, images = ?identity.images, "Obtained images");
        Ok(())
    }
}

/// Sort candidates by descending confidence.
fn rank(candidates: impl Iterator<Item = Candidate>) -> Vec<Candidate> {
    let mut results: Vec<Candidate> = candidates.collect();
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

/// Highest vote average wins; larger width breaks ties.
fn best_image(images: &[ImageInfo]) -> Option<&ImageInfo> {
    images.iter().max_by(|a, b| {
        a.vote_average
            .partial_cmp(&b.vote_average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.width.cmp(&b.width))
    })
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}
