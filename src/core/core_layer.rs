// The core module contains all business logic.
// Each game gets its own submodule.

#[path = "premium/premium_service.rs"]
pub mod premium;

#[path = "ask/ask_service.rs"]
pub mod ask;

#[path = "fight/mod.rs"]
pub mod fight;

#[path = "ship/ship_service.rs"]
pub mod ship;

#[path = "bank/bank_service.rs"]
pub mod bank;
