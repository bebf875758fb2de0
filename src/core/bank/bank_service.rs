// Bank engine core - Sparks (currency) and Echo XP (levelling).
//
// Accounts are global per user, not per guild. Other games (duels) call into
// this service to pay out rewards.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Sparks granted when an account is opened.
pub const STARTING_SPARKS: i64 = 100;

/// Echo XP needed per level: reaching level N+1 costs N * 500.
pub const XP_PER_LEVEL: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: u64,
    pub sparks: i64,
    pub echo_xp: i64,
    pub echo_level: i64,
}

impl Account {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            sparks: STARTING_SPARKS,
            echo_xp: 0,
            echo_level: 1,
        }
    }

    pub fn xp_needed(&self) -> i64 {
        xp_needed(self.echo_level)
    }
}

/// Result of an Echo XP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGrant {
    pub leveled_up: bool,
    pub level: i64,
}

pub fn xp_needed(level: i64) -> i64 {
    level.max(1) * XP_PER_LEVEL
}

/// Add XP to a (xp, level) pair. Crossing the threshold spends it and grants
/// exactly one level, leftover XP carries over.
pub fn apply_xp(xp: i64, level: i64, amount: i64) -> (i64, i64, bool) {
    let new_xp = (xp + amount).max(0);
    let needed = xp_needed(level);
    if new_xp >= needed {
        (new_xp - needed, level + 1, true)
    } else {
        (new_xp, level, false)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BankError {
    #[error("Insufficient Sparks: need {required}, but only have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Store error: {0}")]
    StoreError(String),
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

#[async_trait]
pub trait BankStore: Send + Sync {
    /// Create the account if missing. Returns true when it was created.
    async fn open_account(&self, user_id: u64) -> Result<bool, BankError>;

    /// Fetch an account that is known to exist.
    async fn get_account(&self, user_id: u64) -> Result<Account, BankError>;

    /// Add (or remove, when negative) Sparks and return the new balance.
    /// Must refuse with `InsufficientFunds` instead of going below zero.
    async fn add_sparks(&self, user_id: u64, amount: i64) -> Result<i64, BankError>;

    /// Overwrite Echo XP and level.
    async fn set_progress(&self, user_id: u64, echo_xp: i64, echo_level: i64)
        -> Result<(), BankError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct BankService<S: BankStore> {
    store: S,
    // Balance and XP updates are read-modify-write
    write_lock: Mutex<()>,
}

impl<S: BankStore> BankService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Ensure the user exists in the engine.
    pub async fn open_account(&self, user_id: u64) -> Result<bool, BankError> {
        let created = self.store.open_account(user_id).await?;
        if created {
            tracing::info!(user_id, "Opened bank account");
        }
        Ok(created)
    }

    /// Add or remove Sparks. A balance can never drop below zero.
    pub async fn update_sparks(&self, user_id: u64, amount: i64) -> Result<i64, BankError> {
        let _guard = self.write_lock.lock().await;
        self.open_account(user_id).await?;
        let account = self.store.get_account(user_id).await?;

        if account.sparks + amount < 0 {
            return Err(BankError::InsufficientFunds {
                required: -amount,
                available: account.sparks,
            });
        }

        self.store.add_sparks(user_id, amount).await
    }

    /// Grant Echo XP and handle automatic levelling.
    pub async fn update_echo_xp(&self, user_id: u64, amount: i64) -> Result<XpGrant, BankError> {
        let _guard = self.write_lock.lock().await;
        self.open_account(user_id).await?;
        let account = self.store.get_account(user_id).await?;

        let (xp, level, leveled_up) = apply_xp(account.echo_xp, account.echo_level, amount);
        self.store.set_progress(user_id, xp, level).await?;

        if leveled_up {
            tracing::info!(user_id, level, "Echo level up");
        }

        Ok(XpGrant { leveled_up, level })
    }

    /// All engine data for a user, opening the account on first sight.
    pub async fn get_user_data(&self, user_id: u64) -> Result<Account, BankError> {
        self.open_account(user_id).await?;
        self.store.get_account(user_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // Simple in-memory store for testing
    struct InMemoryBankStore {
        accounts: Arc<Mutex<HashMap<u64, Account>>>,
    }

    impl InMemoryBankStore {
        fn new() -> Self {
            Self {
                accounts: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    #[async_trait]
    impl BankStore for InMemoryBankStore {
        async fn open_account(&self, user_id: u64) -> Result<bool, BankError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&user_id) {
                return Ok(false);
            }
            accounts.insert(user_id, Account::new(user_id));
            Ok(true)
        }

        async fn get_account(&self, user_id: u64) -> Result<Account, BankError> {
            self.accounts
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .ok_or_else(|| BankError::StoreError("missing account".to_string()))
        }

        async fn add_sparks(&self, user_id: u64, amount: i64) -> Result<i64, BankError> {
            // Yield between the read and the write so unserialised callers interleave
            let current = self.get_account(user_id).await?.sparks;
            tokio::task::yield_now().await;
            if current + amount < 0 {
                return Err(BankError::InsufficientFunds {
                    required: -amount,
                    available: current,
                });
            }
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .get_mut(&user_id)
                .ok_or_else(|| BankError::StoreError("missing account".to_string()))?;
            account.sparks = current + amount;
            Ok(account.sparks)
        }

        async fn set_progress(
            &self,
            user_id: u64,
            echo_xp: i64,
            echo_level: i64,
        ) -> Result<(), BankError> {
            if let Some(account) = self.accounts.lock().unwrap().get_mut(&user_id) {
                account.echo_xp = echo_xp;
                account.echo_level = echo_level;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_open_account_once() {
        let service = BankService::new(InMemoryBankStore::new());

        assert!(service.open_account(1).await.unwrap());
        assert!(!service.open_account(1).await.unwrap());

        let account = service.get_user_data(1).await.unwrap();
        assert_eq!(account, Account::new(1));
        assert_eq!(account.sparks, 100);
    }

    #[tokio::test]
    async fn test_update_sparks() {
        let service = BankService::new(InMemoryBankStore::new());

        assert_eq!(service.update_sparks(1, 50).await.unwrap(), 150);
        assert_eq!(service.update_sparks(1, -150).await.unwrap(), 0);

        let err = service.update_sparks(1, -1).await.unwrap_err();
        assert!(matches!(
            err,
            BankError::InsufficientFunds {
                required: 1,
                available: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_level_up_carries_leftover_xp() {
        let service = BankService::new(InMemoryBankStore::new());

        let grant = service.update_echo_xp(1, 499).await.unwrap();
        assert_eq!(grant, XpGrant { leveled_up: false, level: 1 });

        let grant = service.update_echo_xp(1, 11).await.unwrap();
        assert_eq!(grant, XpGrant { leveled_up: true, level: 2 });

        let account = service.get_user_data(1).await.unwrap();
        assert_eq!(account.echo_xp, 10);
        assert_eq!(account.xp_needed(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() {
        let service = Arc::new(BankService::new(InMemoryBankStore::new()));
        service.open_account(1).await.unwrap();

        let debits: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.update_sparks(1, -100).await })
            })
            .collect();

        let mut paid = 0;
        for debit in debits {
            match debit.await.unwrap() {
                Ok(balance) => {
                    assert_eq!(balance, 0);
                    paid += 1;
                }
                Err(e) => assert!(matches!(e, BankError::InsufficientFunds { .. })),
            }
        }

        assert_eq!(paid, 1);
        assert_eq!(service.get_user_data(1).await.unwrap().sparks, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_xp_grants_all_land() {
        let service = Arc::new(BankService::new(InMemoryBankStore::new()));

        let grants: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.update_echo_xp(5, 50).await })
            })
            .collect();
        for grant in grants {
            grant.await.unwrap().unwrap();
        }

        let account = service.get_user_data(5).await.unwrap();
        assert_eq!((account.echo_xp, account.echo_level), (400, 1));
    }

    #[test]
    fn test_apply_xp_grants_a_single_level() {
        // A huge grant still only moves one level per call
        assert_eq!(apply_xp(0, 1, 5_000), (4_500, 2, true));
        assert_eq!(apply_xp(100, 3, 200), (300, 3, false));
        assert_eq!(apply_xp(0, 2, 1_000), (0, 3, true));
    }
}
