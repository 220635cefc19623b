// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Typed representations of Oura API v2 response shapes. Collection
//! endpoints wrap their records in a [`PageEnvelope`]; single-document
//! endpoints return the record directly.
//!
//! Fields the API may omit (older ring generations, missing subscription
//! tiers) are `Option`. Unknown fields are ignored at the parse boundary;
//! a missing *required* field surfaces as `ApiError::Protocol` rather
//! than panicking deeper in the stack.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One page of a collection response.
///
/// `next_token` is the opaque continuation cursor; `None` (or an empty
/// string, which some endpoints emit) marks the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// User profile and physical baseline data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub id: String,
    pub age: Option<u32>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in meters
    pub height: Option<f64>,
    pub biological_sex: Option<String>,
    pub email: Option<String>,
}

/// Daily sleep summary with the overall score and its contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySleep {
    pub id: String,
    pub day: NaiveDate,
    /// Overall sleep score (0-100)
    pub score: Option<u32>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub contributors: Option<SleepContributors>,
}

/// Per-factor contributions to the daily sleep score (each 0-100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepContributors {
    pub deep_sleep: Option<u32>,
    pub efficiency: Option<u32>,
    pub latency: Option<u32>,
    pub rem_sleep: Option<u32>,
    pub restfulness: Option<u32>,
    pub timing: Option<u32>,
    pub total_sleep: Option<u32>,
}

/// Daily activity summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivity {
    pub id: String,
    pub day: NaiveDate,
    /// Overall activity score (0-100)
    pub score: Option<u32>,
    pub active_calories: Option<u32>,
    pub total_calories: Option<u32>,
    pub steps: Option<u64>,
    /// Walking distance equivalent to the day's activity, in meters
    pub equivalent_walking_distance: Option<u32>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Daily readiness summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReadiness {
    pub id: String,
    pub day: NaiveDate,
    /// Overall readiness score (0-100)
    pub score: Option<u32>,
    /// Skin temperature deviation from baseline, in degrees Celsius
    pub temperature_deviation: Option<f64>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Daily stress summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStress {
    pub id: String,
    pub day: NaiveDate,
    /// Seconds of the day spent in a high-stress state
    pub stress_high: Option<u32>,
    /// Seconds of the day spent in a recovery state
    pub recovery_high: Option<u32>,
    pub day_summary: Option<String>,
}

/// Daily blood oxygen saturation summary (Gen 3 rings only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySpo2 {
    pub id: String,
    pub day: NaiveDate,
    pub spo2_percentage: Option<Spo2Percentage>,
    pub breathing_disturbance_index: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spo2Percentage {
    pub average: Option<f64>,
}

/// Daily resilience level and contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyResilience {
    pub id: String,
    pub day: NaiveDate,
    /// One of: limited, adequate, solid, strong, exceptional
    pub level: Option<String>,
    pub contributors: Option<ResilienceContributors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceContributors {
    pub sleep_recovery: Option<f64>,
    pub daytime_recovery: Option<f64>,
    pub stress: Option<f64>,
}

/// Daily cardiovascular age prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCardiovascularAge {
    pub day: NaiveDate,
    pub vascular_age: Option<u32>,
}

/// A detailed sleep period (one per sleep, including naps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepPeriod {
    pub id: String,
    pub day: NaiveDate,
    /// One of: sleep, long_sleep, late_nap, rest
    #[serde(rename = "type")]
    pub sleep_type: Option<String>,
    pub bedtime_start: Option<DateTime<FixedOffset>>,
    pub bedtime_end: Option<DateTime<FixedOffset>>,
    /// Total sleep time in seconds
    pub total_sleep_duration: Option<u32>,
    /// Time in bed in seconds
    pub time_in_bed: Option<u32>,
    pub deep_sleep_duration: Option<u32>,
    pub rem_sleep_duration: Option<u32>,
    pub light_sleep_duration: Option<u32>,
    pub awake_time: Option<u32>,
    pub average_heart_rate: Option<f64>,
    /// Average heart rate variability in milliseconds
    pub average_hrv: Option<u32>,
    /// Sleep efficiency percentage (0-100)
    pub efficiency: Option<u32>,
}

/// Optimal bedtime recommendation for a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepTime {
    pub id: String,
    pub day: NaiveDate,
    pub optimal_bedtime: Option<OptimalBedtime>,
    /// One of: improve_efficiency, earlier_bedtime, later_bedtime, ...
    pub recommendation: Option<String>,
    pub status: Option<String>,
}

/// Recommended bedtime window, as offsets in seconds from midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimalBedtime {
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub day_tz: Option<i32>,
}

/// A recorded workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub day: NaiveDate,
    /// Activity name, e.g. "running", "cycling"
    pub activity: Option<String>,
    pub calories: Option<f64>,
    /// Distance in meters
    pub distance: Option<f64>,
    pub start_datetime: Option<DateTime<FixedOffset>>,
    pub end_datetime: Option<DateTime<FixedOffset>>,
    /// One of: easy, moderate, hard
    pub intensity: Option<String>,
    pub label: Option<String>,
    /// How the workout was recorded: manual, autodetected, confirmed, workout_heart_rate
    pub source: Option<String>,
}

/// A guided or unguided session (meditation, breathing, relaxation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub day: NaiveDate,
    #[serde(rename = "type")]
    pub session_type: Option<String>,
    pub start_datetime: Option<DateTime<FixedOffset>>,
    pub end_datetime: Option<DateTime<FixedOffset>>,
    pub mood: Option<String>,
}

/// One heart-rate sample from the 5-minute interval time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub bpm: u32,
    /// Sample origin: awake, rest, sleep, session, live, workout
    pub source: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

/// A user-entered tag with optional free-text comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedTag {
    pub id: String,
    pub tag_type_code: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
    pub comment: Option<String>,
}

/// Ring hardware and configuration details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfiguration {
    pub id: String,
    pub color: Option<String>,
    pub design: Option<String>,
    pub firmware_version: Option<String>,
    pub hardware_type: Option<String>,
    pub set_up_at: Option<DateTime<FixedOffset>>,
    /// US ring size
    pub size: Option<u32>,
}

/// A rest mode period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestModePeriod {
    pub id: String,
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
}

/// VO2 max estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vo2Max {
    pub id: String,
    pub day: NaiveDate,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub vo2_max: Option<f64>,
}
