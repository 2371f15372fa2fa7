//! In-memory learning state shared by the demo tools and resources.
//!
//! One [`LearningState`] is created at startup and handed to every handler
//! that needs it. Each piece of mutable state sits behind its own mutex.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::capability::{CapabilityKind, DispatchRequest, RequestObserver};

/// Number of entries reported in the recent access list
const RECENT_ACCESSES: usize = 10;

/// Distinct URIs kept in the access log; the least recently read is evicted
const MAX_TRACKED_RESOURCES: usize = 256;

/// Estimated minutes of study per remaining day
const MINUTES_PER_DAY: u64 = 60;

/// Static project metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub show_hints: bool,
    pub enable_bonus_challenges: bool,
    pub auto_save: bool,
}

/// User preferences for the learning environment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub language: String,
    pub difficulty: Difficulty,
    pub preferences: Preferences,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: "en".to_string(),
            difficulty: Difficulty::Beginner,
            preferences: Preferences {
                show_hints: true,
                enable_bonus_challenges: false,
                auto_save: true,
            },
        }
    }
}

/// Partial settings change; `None` leaves a value untouched
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub show_hints: Option<bool>,
    pub enable_bonus_challenges: Option<bool>,
    pub auto_save: Option<bool>,
}

impl UserSettings {
    fn apply(&mut self, update: SettingsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(language) = update.language.filter(|l| !l.trim().is_empty()) {
            self.language = language;
        }
        if let Some(difficulty) = update.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(show_hints) = update.show_hints {
            self.preferences.show_hints = show_hints;
        }
        if let Some(enable) = update.enable_bonus_challenges {
            self.preferences.enable_bonus_challenges = enable;
        }
        if let Some(auto_save) = update.auto_save {
            self.preferences.auto_save = auto_save;
        }
    }
}

/// Progress through the seven-day course
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProgress {
    pub current_day: u32,
    pub completed_days: Vec<u32>,
    pub total_days: u32,
    pub skills_learned: Vec<String>,
    pub challenges_completed: Vec<String>,
    /// Minutes
    pub time_spent: u64,
}

impl Default for LearningProgress {
    fn default() -> Self {
        Self {
            current_day: 3,
            completed_days: vec![1, 2],
            total_days: 7,
            skills_learned: vec![
                "MCP server setup".to_string(),
                "Basic tool creation".to_string(),
                "Input validation".to_string(),
                "Error handling".to_string(),
                "Multi-tool development".to_string(),
            ],
            challenges_completed: vec![
                "greeting-tool-basic".to_string(),
                "greeting-tool-time-aware".to_string(),
                "calculator-with-validation".to_string(),
                "text-analyzer-advanced".to_string(),
            ],
            time_spent: 180,
        }
    }
}

impl LearningProgress {
    /// Completed share of the course, rounded to a whole percent
    pub fn percentage(&self) -> u32 {
        if self.total_days == 0 {
            return 100;
        }
        (self.completed_days.len() as f64 / self.total_days as f64 * 100.0).round() as u32
    }

    pub fn next_milestone(&self) -> String {
        if self.current_day <= self.total_days {
            format!("Complete Day {}", self.current_day)
        } else {
            "All days completed!".to_string()
        }
    }

    /// Minutes left at a fixed pace per remaining day
    pub fn estimated_time_remaining(&self) -> u64 {
        let remaining = (self.total_days as usize).saturating_sub(self.completed_days.len());
        remaining as u64 * MINUTES_PER_DAY
    }

    fn complete_day(&mut self, day: u32, skills: Vec<String>, minutes: u64) {
        if !self.completed_days.contains(&day) {
            self.completed_days.push(day);
        }
        self.skills_learned.extend(skills);
        self.time_spent = self.time_spent.saturating_add(minutes);
        self.current_day = self.current_day.max(day + 1);
    }
}

/// Progress plus derived fields, as served by the progress resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    #[serde(flatten)]
    pub progress: LearningProgress,
    pub progress_percentage: u32,
    pub next_milestone: String,
    pub estimated_time_remaining: u64,
}

impl From<LearningProgress> for ProgressReport {
    fn from(progress: LearningProgress) -> Self {
        Self {
            progress_percentage: progress.percentage(),
            next_milestone: progress.next_milestone(),
            estimated_time_remaining: progress.estimated_time_remaining(),
            progress,
        }
    }
}

/// One entry of the resource access log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    pub access_count: u64,
}

/// Per-URI access records plus a running total that survives eviction
#[derive(Debug, Default)]
struct AccessLog {
    records: Vec<AccessRecord>,
    total: u64,
}

impl AccessLog {
    fn record(&mut self, uri: &str, now: DateTime<Utc>) {
        self.total = self.total.saturating_add(1);

        if let Some(record) = self.records.iter_mut().find(|record| record.uri == uri) {
            record.access_count = record.access_count.saturating_add(1);
            record.timestamp = now;
            return;
        }

        if self.records.len() >= MAX_TRACKED_RESOURCES {
            let stalest = self
                .records
                .iter()
                .enumerate()
                .min_by_key(|(_, record)| record.timestamp)
                .map(|(index, _)| index);
            if let Some(index) = stalest {
                let evicted = self.records.remove(index);
                debug!("Access log full, dropped {}", evicted.uri);
            }
        }

        self.records.push(AccessRecord {
            uri: uri.to_string(),
            timestamp: now,
            access_count: 1,
        });
    }
}

/// Summary of resource reads
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub total_accesses: u64,
    pub unique_resources: usize,
    pub most_accessed_resource: String,
    pub access_log: Vec<AccessRecord>,
    pub generated_at: DateTime<Utc>,
}

/// Mutable demonstration state
#[derive(Debug)]
pub struct LearningState {
    project: ProjectInfo,
    settings: Mutex<UserSettings>,
    progress: Mutex<LearningProgress>,
    access_log: Mutex<AccessLog>,
}

impl LearningState {
    pub fn new() -> Self {
        Self {
            project: ProjectInfo {
                name: "MCP Learning Project".to_string(),
                version: crate::SERVER_VERSION.to_string(),
                description:
                    "A comprehensive learning project for Model Context Protocol development"
                        .to_string(),
                features: vec![
                    "Step-by-step learning exercises".to_string(),
                    "Day-by-day progression".to_string(),
                    "Hands-on tool building".to_string(),
                    "Resource management".to_string(),
                    "Prompt templates".to_string(),
                ],
                last_updated: Utc::now(),
            },
            settings: Mutex::new(UserSettings::default()),
            progress: Mutex::new(LearningProgress::default()),
            access_log: Mutex::new(AccessLog::default()),
        }
    }

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    pub async fn settings(&self) -> UserSettings {
        self.settings.lock().await.clone()
    }

    /// Apply a partial update and return the new settings
    pub async fn update_settings(&self, update: SettingsUpdate) -> UserSettings {
        let mut settings = self.settings.lock().await;
        settings.apply(update);
        settings.clone()
    }

    pub async fn progress(&self) -> LearningProgress {
        self.progress.lock().await.clone()
    }

    /// Mark a day complete and return the new progress
    pub async fn complete_day(&self, day: u32, skills: Vec<String>, minutes: u64) -> LearningProgress {
        let mut progress = self.progress.lock().await;
        progress.complete_day(day, skills, minutes);
        progress.clone()
    }

    /// Count a read of `uri`, known or not
    pub async fn record_access(&self, uri: &str) {
        self.access_log.lock().await.record(uri, Utc::now());
    }

    pub async fn usage_report(&self) -> UsageReport {
        let log = self.access_log.lock().await;

        // Ties go to the resource read first
        let most_accessed = log
            .records
            .iter()
            .reduce(|best, record| {
                if record.access_count > best.access_count {
                    record
                } else {
                    best
                }
            })
            .map_or_else(|| "none".to_string(), |record| record.uri.clone());

        let mut recent = log.records.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(RECENT_ACCESSES);

        UsageReport {
            total_accesses: log.total,
            unique_resources: log.records.len(),
            most_accessed_resource: most_accessed,
            access_log: recent,
            generated_at: Utc::now(),
        }
    }
}

impl Default for LearningState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RequestObserver for LearningState {
    async fn observe(&self, request: &DispatchRequest) {
        if request.kind == CapabilityKind::Resource {
            self.record_access(&request.identifier).await;
        }
    }
}
