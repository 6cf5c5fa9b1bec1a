//! Authentication endpoint server.
//!
//! Hosts the HTTP surface the proxy server talks to: `POST /auth` for
//! per-connection eligibility decisions, `POST /usage` for traffic
//! accounting, plus `/health` and a loopback-only `POST /reload`.

pub mod cli;
mod error;
mod handler;
mod reload;
mod server;
mod state;

pub use cli::ServerArgs;
pub use error::ServerError;
pub use reload::{ReloadSummary, reload};
pub use server::{build_state, serve, serve_on};
pub use state::{AppState, HealthState};

pub use tokio_util::sync::CancellationToken;
