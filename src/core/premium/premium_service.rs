// Premium entitlements - which guild has unlocked which game module, and until when.
//
// Platform-agnostic like the rest of core: guild ids are plain u64 and time is
// passed in by the caller so every rule here can be tested without a clock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A feature module that a guild can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PremiumModule {
    Ask,
    Fight,
    Ship,
    Bank,
}

impl PremiumModule {
    pub const ALL: [PremiumModule; 4] = [
        PremiumModule::Ask,
        PremiumModule::Fight,
        PremiumModule::Ship,
        PremiumModule::Bank,
    ];

    /// Name used in the side-file and in payment payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumModule::Ask => "ask",
            PremiumModule::Fight => "fight",
            PremiumModule::Ship => "ship",
            PremiumModule::Bank => "bank",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PremiumModule::Ask => "ASK",
            PremiumModule::Fight => "FIGHT",
            PremiumModule::Ship => "SHIP",
            PremiumModule::Bank => "ECONOMY ENGINE",
        }
    }

    pub fn perks(&self) -> &'static str {
        match self {
            PremiumModule::Ask => "Glowing visual VS lobbies and the admin request history.",
            PremiumModule::Fight => "Gradient health bars in the Echo Arena.",
            PremiumModule::Ship => "The Love Meter and matchmaking cards.",
            PremiumModule::Bank => "Sparks, Echo levels and member profiles.",
        }
    }
}

impl fmt::Display for PremiumModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PremiumModule {
    type Err = PremiumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(PremiumModule::Ask),
            "fight" => Ok(PremiumModule::Fight),
            "ship" => Ok(PremiumModule::Ship),
            "bank" | "economy" => Ok(PremiumModule::Bank),
            other => Err(PremiumError::UnknownModule(other.to_string())),
        }
    }
}

/// An unlocked module. `expires_at == None` means the unlock never lapses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entitlement {
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    pub fn permanent() -> Self {
        Self { expires_at: None }
    }

    pub fn until(expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(expires_at),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > now,
        }
    }
}

pub type GuildEntitlements = HashMap<PremiumModule, Entitlement>;

/// How a module looks to a guild right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleState {
    Permanent,
    ActiveUntil(DateTime<Utc>),
    Expired(DateTime<Utc>),
    Locked,
}

impl ModuleState {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, ModuleState::Permanent | ModuleState::ActiveUntil(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleStatus {
    pub module: PremiumModule,
    pub state: ModuleState,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PremiumError {
    #[error("Unknown module `{0}` (expected ask, fight, ship or bank)")]
    UnknownModule(String),

    #[error("Module {0} is not active for this guild")]
    NotActive(PremiumModule),

    #[error("Invalid guild ID")]
    InvalidGuild,

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

#[async_trait]
pub trait PremiumStore: Send + Sync {
    /// All entitlements of a guild; empty when the guild never bought anything.
    async fn get_guild(&self, guild_id: u64) -> Result<GuildEntitlements, PremiumError>;

    /// Replace the entitlements of a guild and persist them.
    async fn save_guild(
        &self,
        guild_id: u64,
        entitlements: GuildEntitlements,
    ) -> Result<(), PremiumError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct PremiumService<S: PremiumStore> {
    store: S,
    // A guild's entitlements are saved as a whole map
    write_lock: Mutex<()>,
}

impl<S: PremiumStore> PremiumService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn validate_guild(guild_id: u64) -> Result<(), PremiumError> {
        if guild_id == 0 {
            Err(PremiumError::InvalidGuild)
        } else {
            Ok(())
        }
    }

    /// Is `module` unlocked for `guild_id` at `now`?
    pub async fn is_active(
        &self,
        guild_id: u64,
        module: PremiumModule,
        now: DateTime<Utc>,
    ) -> Result<bool, PremiumError> {
        let entitlements = self.store.get_guild(guild_id).await?;
        Ok(entitlements
            .get(&module)
            .map(|e| e.is_active(now))
            .unwrap_or(false))
    }

    /// Unlock a module.
    ///
    /// `days == None` grants a permanent unlock. A timed unlock on top of a
    /// still-running one extends it from the current expiry; a permanent unlock
    /// stays permanent.
    pub async fn activate(
        &self,
        guild_id: u64,
        module: PremiumModule,
        days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, PremiumError> {
        Self::validate_guild(guild_id)?;

        let _guard = self.write_lock.lock().await;
        let mut entitlements = self.store.get_guild(guild_id).await?;
        let current = entitlements.get(&module).copied();

        let granted = match (current, days) {
            (Some(existing), _) if existing.expires_at.is_none() => existing,
            (_, None) => Entitlement::permanent(),
            (existing, Some(days)) => {
                let base = existing
                    .and_then(|e| e.expires_at)
                    .filter(|expiry| *expiry > now)
                    .unwrap_or(now);
                Entitlement::until(base + Duration::days(i64::from(days)))
            }
        };

        entitlements.insert(module, granted);
        self.store.save_guild(guild_id, entitlements).await?;

        tracing::info!(
            guild_id,
            module = module.as_str(),
            expires_at = ?granted.expires_at,
            "Premium module activated"
        );

        Ok(granted)
    }

    /// Revoke a module, whether it is still running or already lapsed.
    pub async fn deactivate(
        &self,
        guild_id: u64,
        module: PremiumModule,
    ) -> Result<(), PremiumError> {
        Self::validate_guild(guild_id)?;

        let _guard = self.write_lock.lock().await;
        let mut entitlements = self.store.get_guild(guild_id).await?;
        if entitlements.remove(&module).is_none() {
            return Err(PremiumError::NotActive(module));
        }
        self.store.save_guild(guild_id, entitlements).await?;

        tracing::info!(guild_id, module = module.as_str(), "Premium module revoked");
        Ok(())
    }

    /// Every module with its current state, in display order.
    pub async fn status(
        &self,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ModuleStatus>, PremiumError> {
        let entitlements = self.store.get_guild(guild_id).await?;

        Ok(PremiumModule::ALL
            .iter()
            .map(|module| {
                let state = match entitlements.get(module) {
                    None => ModuleState::Locked,
                    Some(Entitlement { expires_at: None }) => ModuleState::Permanent,
                    Some(Entitlement {
                        expires_at: Some(expiry),
                    }) if *expiry > now => ModuleState::ActiveUntil(*expiry),
                    Some(Entitlement {
                        expires_at: Some(expiry),
                    }) => ModuleState::Expired(*expiry),
                };
                ModuleStatus {
                    module: *module,
                    state,
                }
            })
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
