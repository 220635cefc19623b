// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Oura API Client
//!
//! Turns a logical request (endpoint + typed parameters) into one or more
//! HTTP calls against the Oura API v2: attaches bearer authentication,
//! performs a single 401 refresh-and-retry cycle, follows `next_token`
//! pagination, and maps every failure into an [`ApiError`] kind.
//!
//! The client is synchronous relative to the logical call that triggered
//! it: no background tasks, no internal backoff, no caching beyond the
//! pagination accumulator. Individual calls may run concurrently against
//! the same [`CredentialStore`], which serializes refresh attempts.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::constants::{env_config, limits};
use crate::errors::ApiError;
use crate::logging::AppLogger;
use crate::models::{
    DailyActivity, DailyCardiovascularAge, DailyReadiness, DailyResilience, DailySleep,
    DailySpo2, DailyStress, EnhancedTag, HeartRateSample, PageEnvelope, PersonalInfo,
    RestModePeriod, RingConfiguration, Session, SleepPeriod, SleepTime, Vo2Max, Workout,
};
use crate::oauth::CredentialStore;

/// Calendar-date query bounds (`start_date`/`end_date`), used by daily
/// summary and document-collection endpoints.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![(
            "start_date".to_string(),
            self.start_date.format("%Y-%m-%d").to_string(),
        )];
        if let Some(end) = self.end_date {
            query.push(("end_date".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

/// Timestamp query bounds (`start_datetime`/`end_datetime`) with explicit
/// offsets, used by the heart-rate time series.
#[derive(Debug, Clone, Copy)]
pub struct DatetimeRange {
    pub start_datetime: DateTime<FixedOffset>,
    pub end_datetime: Option<DateTime<FixedOffset>>,
}

impl DatetimeRange {
    pub fn new(
        start_datetime: DateTime<FixedOffset>,
        end_datetime: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            start_datetime,
            end_datetime,
        }
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![(
            "start_datetime".to_string(),
            self.start_datetime.to_rfc3339(),
        )];
        if let Some(end) = self.end_datetime {
            query.push(("end_datetime".to_string(), end.to_rfc3339()));
        }
        query
    }
}

/// One logical call makes at most two HTTP attempts: the initial one and,
/// after a successful token refresh, a single retry.
enum Attempt {
    Initial,
    Retried,
}

/// Authenticated client for the Oura API v2.
pub struct OuraClient {
    http: Client,
    base_url: String,
    store: Arc<CredentialStore>,
}

impl OuraClient {
    pub fn new(store: Arc<CredentialStore>) -> Result<Self> {
        let base_url = env_config::oura_api_base();
        Self::with_base_url(store, base_url)
    }

    /// Build against an explicit base URL (tests point this at a mock
    /// server).
    pub fn with_base_url(store: Arc<CredentialStore>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(limits::HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
        })
    }

    /// Single-call protocol: one authenticated GET with at most one
    /// refresh-and-retry cycle on 401.
    ///
    /// The outcome of the retried call is final; a second 401 surfaces as
    /// `ApiError::Auth` rather than triggering another refresh.
    async fn do_request(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = Attempt::Initial;

        loop {
            let token = self.store.current_access_token().await;
            let started = Instant::now();
            let response = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| {
                    AppLogger::log_api_request(path, None, started.elapsed().as_millis() as u64);
                    transport_error(&e)
                })?;

            let status = response.status().as_u16();
            AppLogger::log_api_request(path, Some(status), started.elapsed().as_millis() as u64);
            let body = response.text().await.map_err(|e| ApiError::Transport {
                detail: format!("response body unreadable: {e}"),
            })?;

            if (200..300).contains(&status) {
                return serde_json::from_str(&body).map_err(|e| ApiError::Protocol {
                    detail: format!("malformed response body: {e}"),
                });
            }

            if status == 401
                && matches!(attempt, Attempt::Initial)
                && self.store.can_refresh().await
            {
                debug!("401 from {path}, attempting token refresh");
                self.store.refresh(&token).await?;
                attempt = Attempt::Retried;
                continue;
            }

            if status == 401 && matches!(attempt, Attempt::Retried) {
                warn!("Retried call to {path} still unauthorized after refresh");
            }

            return Err(ApiError::from_response(status, &body));
        }
    }

    /// Pagination protocol: fold over pages, threading `next_token`, until
    /// the cursor is null, absent, or empty.
    ///
    /// Any intermediate failure aborts the whole aggregation; pages already
    /// fetched are discarded rather than returned as a silent partial
    /// result.
    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>, ApiError> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut page_query = query.clone();
            if let Some(token) = &next_token {
                page_query.push(("next_token".to_string(), token.clone()));
            }

            let value = self.do_request(path, &page_query).await?;
            let page: PageEnvelope<T> =
                serde_json::from_value(value).map_err(|e| ApiError::Protocol {
                    detail: format!("malformed page envelope: {e}"),
                })?;

            records.extend(page.data);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Single-document lookup: no pagination envelope, the parsed object
    /// is returned directly (404 maps to `ApiError::NotFound`).
    async fn fetch_document<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ApiError> {
        let value = self.do_request(path, &[]).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Protocol {
            detail: format!("malformed document body: {e}"),
        })
    }

    // Personal information

    /// Get the user's profile and physical baseline data.
    pub async fn get_personal_info(&self) -> Result<PersonalInfo, ApiError> {
        self.fetch_document("/v2/usercollection/personal_info").await
    }

    // Daily summaries

    /// Get daily sleep summaries including sleep score and contributors.
    pub async fn get_daily_sleep(&self, range: &DateRange) -> Result<Vec<DailySleep>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_sleep", range.query())
            .await
    }

    /// Get daily activity summaries.
    pub async fn get_daily_activity(
        &self,
        range: &DateRange,
    ) -> Result<Vec<DailyActivity>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_activity", range.query())
            .await
    }

    /// Get daily readiness summaries.
    pub async fn get_daily_readiness(
        &self,
        range: &DateRange,
    ) -> Result<Vec<DailyReadiness>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_readiness", range.query())
            .await
    }

    /// Get daily stress summaries.
    pub async fn get_daily_stress(&self, range: &DateRange) -> Result<Vec<DailyStress>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_stress", range.query())
            .await
    }

    /// Get daily SpO2 summaries (Gen 3 ring only).
    pub async fn get_daily_spo2(&self, range: &DateRange) -> Result<Vec<DailySpo2>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_spo2", range.query())
            .await
    }

    /// Get daily resilience summaries.
    pub async fn get_daily_resilience(
        &self,
        range: &DateRange,
    ) -> Result<Vec<DailyResilience>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_resilience", range.query())
            .await
    }

    /// Get daily cardiovascular age predictions.
    pub async fn get_daily_cardiovascular_age(
        &self,
        range: &DateRange,
    ) -> Result<Vec<DailyCardiovascularAge>, ApiError> {
        self.fetch_collection("/v2/usercollection/daily_cardiovascular_age", range.query())
            .await
    }

    // Detailed sleep data

    /// Get detailed sleep periods.
    pub async fn get_sleep_periods(
        &self,
        range: &DateRange,
    ) -> Result<Vec<SleepPeriod>, ApiError> {
        self.fetch_collection("/v2/usercollection/sleep", range.query())
            .await
    }

    /// Get one sleep period by document id.
    pub async fn get_sleep_period(&self, id: &str) -> Result<SleepPeriod, ApiError> {
        self.fetch_document(&format!("/v2/usercollection/sleep/{id}"))
            .await
    }

    /// Get optimal bedtime recommendations.
    pub async fn get_sleep_time(&self, range: &DateRange) -> Result<Vec<SleepTime>, ApiError> {
        self.fetch_collection("/v2/usercollection/sleep_time", range.query())
            .await
    }

    // Activity and workouts

    /// Get workout summaries.
    pub async fn get_workouts(&self, range: &DateRange) -> Result<Vec<Workout>, ApiError> {
        self.fetch_collection("/v2/usercollection/workout", range.query())
            .await
    }

    /// Get one workout by document id.
    pub async fn get_workout(&self, id: &str) -> Result<Workout, ApiError> {
        self.fetch_document(&format!("/v2/usercollection/workout/{id}"))
            .await
    }

    /// Get session data (meditation, breathing, relaxation).
    pub async fn get_sessions(&self, range: &DateRange) -> Result<Vec<Session>, ApiError> {
        self.fetch_collection("/v2/usercollection/session", range.query())
            .await
    }

    /// Get one session by document id.
    pub async fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        self.fetch_document(&format!("/v2/usercollection/session/{id}"))
            .await
    }

    // Time-series data

    /// Get heart-rate samples (5-minute intervals).
    pub async fn get_heartrate(
        &self,
        range: &DatetimeRange,
    ) -> Result<Vec<HeartRateSample>, ApiError> {
        self.fetch_collection("/v2/usercollection/heartrate", range.query())
            .await
    }

    // User annotations

    /// Get user-entered enhanced tags.
    pub async fn get_enhanced_tags(
        &self,
        range: &DateRange,
    ) -> Result<Vec<EnhancedTag>, ApiError> {
        self.fetch_collection("/v2/usercollection/enhanced_tag", range.query())
            .await
    }

    // Device information

    /// Get ring configuration and device information.
    pub async fn get_ring_configuration(&self) -> Result<Vec<RingConfiguration>, ApiError> {
        self.fetch_collection("/v2/usercollection/ring_configuration", Vec::new())
            .await
    }

    /// Get rest mode periods.
    pub async fn get_rest_mode_periods(
        &self,
        range: &DateRange,
    ) -> Result<Vec<RestModePeriod>, ApiError> {
        self.fetch_collection("/v2/usercollection/rest_mode_period", range.query())
            .await
    }

    // Fitness metrics

    /// Get VO2 max estimates.
    pub async fn get_vo2_max(&self, range: &DateRange) -> Result<Vec<Vo2Max>, ApiError> {
        self.fetch_collection("/v2/usercollection/vO2_max", range.query())
            .await
    }
}

fn transport_error(error: &reqwest::Error) -> ApiError {
    let detail = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    };
    ApiError::Transport { detail }
}
