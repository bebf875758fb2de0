// JSON implementation of the PremiumStore trait (`premium_guilds.json`).
//
// Two layouts exist in the wild:
//   { "123": ["ask", "ship"] }                      -> every listed module is permanent
//   { "123": { "fight": 1767225600.0, "ask": null } } -> unix-seconds expiry, null = permanent
// Both are read; the second one is always written back.

use crate::core::premium::{Entitlement, GuildEntitlements, PremiumError, PremiumModule, PremiumStore};
use crate::infra::json_file;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredGuild {
    Legacy(Vec<String>),
    Timed(HashMap<String, serde_json::Value>),
}

/// Serialized form: module name -> expiry seconds (None = permanent).
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct WrittenGuild(BTreeMap<&'static str, Option<f64>>);

pub struct JsonPremiumStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, GuildEntitlements>>,
}

impl JsonPremiumStore {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let cache = json_file::load(&path, "Premium registry")?
            .map(parse_registry)
            .unwrap_or_default();

        tracing::info!(guilds = cache.len(), path = %path.display(), "Loaded premium registry");

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self) -> Result<(), PremiumError> {
        let cache = self.cache.read().await;
        let written: BTreeMap<String, WrittenGuild> = cache
            .iter()
            .map(|(guild_id, entitlements)| {
                let modules = entitlements
                    .iter()
                    .map(|(module, e)| (module.as_str(), e.expires_at.map(to_unix_seconds)))
                    .collect();
                (guild_id.to_string(), WrittenGuild(modules))
            })
            .collect();
        drop(cache);

        json_file::save(&self.path, &written).map_err(storage)
    }
}

#[async_trait]
impl PremiumStore for JsonPremiumStore {
    async fn get_guild(&self, guild_id: u64) -> Result<GuildEntitlements, PremiumError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn save_guild(
        &self,
        guild_id: u64,
        entitlements: GuildEntitlements,
    ) -> Result<(), PremiumError> {
        let mut cache = self.cache.write().await;
        if entitlements.is_empty() {
            cache.remove(&guild_id);
        } else {
            cache.insert(guild_id, entitlements);
        }
        drop(cache); // Release lock before persisting
        self.persist().await
    }
}

fn storage(e: impl std::fmt::Display) -> PremiumError {
    PremiumError::StorageError(e.to_string())
}

/// Unreadable entries are skipped with a warning: a broken entry should only
/// lock modules.
fn parse_registry(stored: HashMap<String, StoredGuild>) -> HashMap<u64, GuildEntitlements> {
    stored
        .into_iter()
        .filter_map(|(guild, entry)| {
            let Ok(guild_id) = guild.parse::<u64>() else {
                tracing::warn!(guild = %guild, "Skipping premium entry with a non-numeric guild id");
                return None;
            };
            Some((guild_id, parse_guild(guild_id, entry)))
        })
        .collect()
}

fn parse_guild(guild_id: u64, entry: StoredGuild) -> GuildEntitlements {
    let mut entitlements = GuildEntitlements::new();

    match entry {
        StoredGuild::Legacy(modules) => {
            for name in modules {
                match name.parse::<PremiumModule>() {
                    Ok(module) => {
                        entitlements.insert(module, Entitlement::permanent());
                    }
                    Err(_) => tracing::warn!(guild_id, module = %name, "Unknown premium module"),
                }
            }
        }
        StoredGuild::Timed(modules) => {
            for (name, value) in modules {
                let Ok(module) = name.parse::<PremiumModule>() else {
                    tracing::warn!(guild_id, module = %name, "Unknown premium module");
                    continue;
                };
                match parse_expiry(&value) {
                    Some(entitlement) => {
                        entitlements.insert(module, entitlement);
                    }
                    None => tracing::warn!(guild_id, module = %name, "Unreadable premium expiry"),
                }
            }
        }
    }

    entitlements
}

/// Expiries show up as numbers, numeric strings or null.
fn parse_expiry(value: &serde_json::Value) -> Option<Entitlement> {
    let seconds = match value {
        serde_json::Value::Null => return Some(Entitlement::permanent()),
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    from_unix_seconds(seconds).map(Entitlement::until)
}

fn from_unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

fn to_unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn reads_legacy_list_as_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_guilds.json");
        std::fs::write(&path, r#"{"42": ["ask", "economy", "dance"]}"#).unwrap();

        let store = JsonPremiumStore::new(&path).unwrap();
        let guild = store.get_guild(42).await.unwrap();

        assert_eq!(guild.len(), 2);
        assert_eq!(guild[&PremiumModule::Ask], Entitlement::permanent());
        assert_eq!(guild[&PremiumModule::Bank], Entitlement::permanent());
    }

    #[tokio::test]
    async fn reads_timed_map_with_mixed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_guilds.json");
        std::fs::write(
            &path,
            r#"{"7": {"fight": 1767225600.5, "ship": "1767225600", "ask": null, "bank": true}}"#,
        )
        .unwrap();

        let store = JsonPremiumStore::new(&path).unwrap();
        let guild = store.get_guild(7).await.unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(guild[&PremiumModule::Ship].expires_at, Some(expected));
        assert_eq!(
            guild[&PremiumModule::Fight].expires_at,
            Some(expected + chrono::Duration::milliseconds(500))
        );
        assert_eq!(guild[&PremiumModule::Ask], Entitlement::permanent());
        assert!(!guild.contains_key(&PremiumModule::Bank));
    }

    #[tokio::test]
    async fn writes_back_timed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("premium_guilds.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"42": ["ask"]}"#).unwrap();

        let store = JsonPremiumStore::new(&path).unwrap();
        let mut guild = store.get_guild(42).await.unwrap();
        let expiry = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        guild.insert(PremiumModule::Fight, Entitlement::until(expiry));
        store.save_guild(42, guild).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["42"]["ask"], serde_json::Value::Null);
        assert_eq!(raw["42"]["fight"].as_f64(), Some(1_767_225_600.0));

        // And a fresh store reads it back identically
        let reopened = JsonPremiumStore::new(&path).unwrap();
        assert_eq!(
            reopened.get_guild(42).await.unwrap()[&PremiumModule::Fight].expires_at,
            Some(expiry)
        );
    }

    #[tokio::test]
    async fn corrupt_file_survives_the_next_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_guilds.json");
        let truncated = r#"{"111": {"ask": null}, "222": {"fig"#;
        std::fs::write(&path, truncated).unwrap();

        let store = JsonPremiumStore::new(&path).unwrap();
        assert!(store.get_guild(111).await.unwrap().is_empty());

        let mut guild = GuildEntitlements::new();
        guild.insert(PremiumModule::Ship, Entitlement::permanent());
        store.save_guild(333, guild).await.unwrap();

        let kept = std::fs::read_to_string(json_file::quarantine_path(&path)).unwrap();
        assert_eq!(kept, truncated);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("333"));
        assert!(!written.contains("111"));
    }

    #[tokio::test]
    async fn emptied_guild_is_dropped_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_guilds.json");

        let store = JsonPremiumStore::new(&path).unwrap();
        store.save_guild(5, GuildEntitlements::new()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.as_object().unwrap().is_empty());
    }
}
