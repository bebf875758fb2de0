// Ask system core - connection requests between two members and their history.
//
// The Discord layer owns the buttons and select menus; everything it needs to
// word a request, judge who may answer it, and report on past requests lives here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many entries the admin history panel shows.
pub const RECENT_HISTORY_LIMIT: usize = 10;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// What the requester wants out of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "SFW")]
    Sfw,
    #[serde(rename = "NSFW")]
    Nsfw,
    #[serde(rename = "Casual")]
    Casual,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Sfw, Intent::Nsfw, Intent::Casual];

    /// Stable value used in select menus and in the history file.
    pub fn value(&self) -> &'static str {
        match self {
            Intent::Sfw => "SFW",
            Intent::Nsfw => "NSFW",
            Intent::Casual => "Casual",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Intent::ALL.into_iter().find(|i| i.value() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Intent::Sfw => "SFW / Professional",
            Intent::Nsfw => "NSFW / Lustful",
            Intent::Casual => "Casual Chat",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Intent::Sfw => "Keep things clean and polite.",
            Intent::Nsfw => "Step into the heat of the dungeon.",
            Intent::Casual => "Just a friendly conversation.",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Intent::Sfw => "🛡️",
            Intent::Nsfw => "🔞",
            Intent::Casual => "💬",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AskStatus {
    Accepted,
    Denied,
}

impl AskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AskStatus::Accepted => "Accepted",
            AskStatus::Denied => "Denied",
        }
    }
}

/// One answered request, as stored in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskEvent {
    pub timestamp: DateTime<Utc>,
    pub requester: String,
    pub target: String,
    pub intent: Intent,
    pub status: AskStatus,
    /// Older entries predate per-guild tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
}

/// The wording and styling the target sees, chosen by intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub title: &'static str,
    pub description: String,
    pub color: u32,
    pub accept_label: &'static str,
    pub decline_label: &'static str,
    pub decline_emoji: &'static str,
}

impl Persona {
    pub fn for_intent(intent: Intent, requester_mention: &str, target_mention: &str) -> Self {
        match intent {
            Intent::Nsfw => Self {
                title: "🫦 LUSTFUL INVITATION",
                description: format!(
                    "{target_mention}, {requester_mention} wants to explore the **NSFW** side of things with you. Do you give in?"
                ),
                color: 0xe91e63,
                accept_label: "Surrender",
                decline_label: "Resist",
                decline_emoji: "🥀",
            },
            other => Self {
                title: "📩 FORMAL REQUEST",
                description: format!(
                    "{target_mention}, {requester_mention} is requesting a **{}** conversation.",
                    other.value()
                ),
                color: 0xff4500,
                accept_label: "Accept",
                decline_label: "Decline",
                decline_emoji: "🛡️",
            },
        }
    }
}

/// Line announced in the channel once the target answers.
pub fn decision_message(intent: Intent, status: AskStatus) -> &'static str {
    match (intent, status) {
        (Intent::Nsfw, AskStatus::Accepted) => "The heat is rising... they said yes.",
        (Intent::Nsfw, AskStatus::Denied) => "Maybe you aren't ready for this fire yet.",
        (_, AskStatus::Accepted) => "The connection has been established.",
        (_, AskStatus::Denied) => "The request was declined.",
    }
}

/// Window offered by the admin history panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Ever,
    LastMonth,
    LastQuarter,
    LastHalfYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Ever,
        Timeframe::LastMonth,
        Timeframe::LastQuarter,
        Timeframe::LastHalfYear,
    ];

    /// Window length in days; `0` means no limit.
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Ever => 0,
            Timeframe::LastMonth => 30,
            Timeframe::LastQuarter => 90,
            Timeframe::LastHalfYear => 180,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Ever => "Since Ever",
            Timeframe::LastMonth => "Last 1 Month",
            Timeframe::LastQuarter => "Last 3 Months",
            Timeframe::LastHalfYear => "Last 6 Months",
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        Timeframe::ALL.into_iter().find(|t| t.days() == days)
    }

    /// Whole days elapsed, compared inclusively, the way the panel always has.
    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let days = self.days();
        days == 0 || (now - timestamp).num_days() <= days
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReport {
    pub total: usize,
    /// Oldest first, at most [`RECENT_HISTORY_LIMIT`] entries.
    pub recent: Vec<AskEvent>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AskError {
    #[error("You cannot ask yourself.")]
    SelfRequest,

    #[error("Bots cannot answer connection requests.")]
    BotTarget,

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

#[async_trait]
pub trait AskHistoryStore: Send + Sync {
    async fn append(&self, event: AskEvent) -> Result<(), AskError>;

    /// Every stored event, oldest first.
    async fn all(&self) -> Result<Vec<AskEvent>, AskError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Reject requests no one could sensibly answer.
pub fn validate_pair(requester_id: u64, target_id: u64, target_is_bot: bool) -> Result<(), AskError> {
    if requester_id == target_id {
        return Err(AskError::SelfRequest);
    }
    if target_is_bot {
        return Err(AskError::BotTarget);
    }
    Ok(())
}

pub struct AskService<S: AskHistoryStore> {
    store: S,
}

impl<S: AskHistoryStore> AskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record the target's answer.
    pub async fn record_decision(
        &self,
        guild_id: u64,
        requester: &str,
        target: &str,
        intent: Intent,
        status: AskStatus,
    ) -> Result<AskEvent, AskError> {
        let event = AskEvent {
            timestamp: Utc::now(),
            requester: requester.to_string(),
            target: target.to_string(),
            intent,
            status,
            guild_id: Some(guild_id),
        };

        self.store.append(event.clone()).await?;
        tracing::info!(
            guild_id,
            intent = intent.value(),
            status = status.as_str(),
            "Ask request answered"
        );

        Ok(event)
    }

    /// Requests answered in this guild inside `timeframe`.
    pub async fn history(
        &self,
        guild_id: u64,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<HistoryReport, AskError> {
        let filtered: Vec<AskEvent> = self
            .store
            .all()
            .await?
            .into_iter()
            .filter(|e| e.guild_id == Some(guild_id))
            .filter(|e| timeframe.contains(e.timestamp, now))
            .collect();

        let total = filtered.len();
        let recent = filtered
            .into_iter()
            .skip(total.saturating_sub(RECENT_HISTORY_LIMIT))
            .collect();

        Ok(HistoryReport { total, recent })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryHistory {
        events: Mutex<Vec<AskEvent>>,
    }

    #[async_trait]
    impl AskHistoryStore for InMemoryHistory {
        async fn append(&self, event: AskEvent) -> Result<(), AskError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn all(&self) -> Result<Vec<AskEvent>, AskError> {
            Ok(self.events.lock().unwrap().clone())
        }
    }

    fn event_at(timestamp: DateTime<Utc>, guild_id: Option<u64>, n: usize) -> AskEvent {
        AskEvent {
            timestamp,
            requester: format!("requester{n}"),
            target: format!("target{n}"),
            intent: Intent::Casual,
            status: AskStatus::Accepted,
            guild_id,
        }
    }

    #[test]
    fn pair_validation() {
        assert!(matches!(
            validate_pair(1, 1, false),
            Err(AskError::SelfRequest)
        ));
        assert!(matches!(
            validate_pair(1, 2, true),
            Err(AskError::BotTarget)
        ));
        assert!(validate_pair(1, 2, false).is_ok());
    }

    #[test]
    fn nsfw_persona_uses_lustful_wording() {
        let persona = Persona::for_intent(Intent::Nsfw, "<@1>", "<@2>");
        assert_eq!(persona.title, "🫦 LUSTFUL INVITATION");
        assert_eq!(persona.color, 0xe91e63);
        assert_eq!(persona.accept_label, "Surrender");
        assert_eq!(persona.decline_label, "Resist");
        assert!(persona.description.starts_with("<@2>, <@1>"));
    }

    #[test]
    fn formal_persona_names_the_intent() {
        let persona = Persona::for_intent(Intent::Casual, "<@1>", "<@2>");
        assert_eq!(persona.title, "📩 FORMAL REQUEST");
        assert_eq!(persona.accept_label, "Accept");
        assert!(persona.description.contains("**Casual**"));
    }

    #[test]
    fn decision_messages_follow_intent() {
        assert_eq!(
            decision_message(Intent::Nsfw, AskStatus::Accepted),
            "The heat is rising... they said yes."
        );
        assert_eq!(
            decision_message(Intent::Sfw, AskStatus::Denied),
            "The request was declined."
        );
    }

    #[test]
    fn intent_values_round_trip_through_select_menu() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_value(intent.value()), Some(intent));
        }
        assert_eq!(Intent::from_value("Spicy"), None);
    }

    #[test]
    fn legacy_history_entries_deserialize() {
        let raw = r#"{
            "timestamp": "2024-05-01T10:00:00.123456+00:00",
            "requester": "alice",
            "target": "bob",
            "intent": "NSFW",
            "status": "Denied"
        }"#;
        let event: AskEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.intent, Intent::Nsfw);
        assert_eq!(event.status, AskStatus::Denied);
        assert_eq!(event.guild_id, None);
    }

    #[tokio::test]
    async fn history_filters_by_guild_and_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let store = InMemoryHistory::default();
        store.append(event_at(now - Duration::days(100), Some(1), 0)).await.unwrap();
        store.append(event_at(now - Duration::days(20), Some(1), 1)).await.unwrap();
        store.append(event_at(now - Duration::days(1), Some(2), 2)).await.unwrap();
        store.append(event_at(now - Duration::days(1), None, 3)).await.unwrap();
        let service = AskService::new(store);

        let ever = service.history(1, Timeframe::Ever, now).await.unwrap();
        assert_eq!(ever.total, 2);

        let month = service.history(1, Timeframe::LastMonth, now).await.unwrap();
        assert_eq!(month.total, 1);
        assert_eq!(month.recent[0].requester, "requester1");
    }

    #[tokio::test]
    async fn history_keeps_only_most_recent_entries() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let store = InMemoryHistory::default();
        for n in 0..15 {
            store.append(event_at(now, Some(9), n)).await.unwrap();
        }
        let service = AskService::new(store);

        let report = service.history(9, Timeframe::Ever, now).await.unwrap();
        assert_eq!(report.total, 15);
        assert_eq!(report.recent.len(), RECENT_HISTORY_LIMIT);
        assert_eq!(report.recent[0].requester, "requester5");
        assert_eq!(report.recent[9].requester, "requester14");
    }

    #[test]
    fn timeframe_window_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(Timeframe::LastMonth.contains(now - Duration::days(30), now));
        assert!(!Timeframe::LastMonth.contains(now - Duration::days(31), now));
        assert!(Timeframe::Ever.contains(now - Duration::days(3000), now));
        assert_eq!(Timeframe::from_days(90), Some(Timeframe::LastQuarter));
    }
}
