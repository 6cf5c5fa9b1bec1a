//! Account registry and eligibility evaluation for warden.
//!
//! This crate is the decision core of the control plane: a durable
//! username → account registry, an in-memory cache of it, a pure
//! eligibility evaluator, and the usage-accounting write path.
//!
//! # Example
//!
//! ```
//! use warden_auth::{Account, Decision, evaluate};
//! use time::macros::date;
//!
//! let account = Account::with_password("secret");
//! let decision = evaluate(Some(&account), "secret", date!(2026 - 08 - 04));
//! assert_eq!(decision, Decision::Allowed);
//! ```

mod account;
mod accounting;
pub mod cli;
mod decision;
mod error;
mod evaluate;
mod registry;
mod store;

pub use account::Account;
pub use accounting::{UsageRecorder, UsageRecorderConfig};
pub use cli::UserArgs;
pub use decision::Decision;
pub use error::StoreError;
pub use evaluate::evaluate;
pub use registry::Registry;
pub use store::{CorruptPolicy, LoadOutcome, LoadSource, RegistryStore};
