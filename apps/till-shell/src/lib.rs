//! # till-shell: Till POS Application Shell
//!
//! Wires the engines into a running point-of-sale app.
//!
//! ## Module Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            till-shell                                   │
//! │                                                                         │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐  │
//! │  │  config  │  │ context  │  │   app    │  │   auth   │  │   host   │  │
//! │  │ till.toml│  │ services │  │ ViewKind │  │ guards   │  │ console  │  │
//! │  │ env vars │  │ for views│  │ routes   │  │ logout   │  │ loop     │  │
//! │  └──────────┘  └──────────┘  └──────────┘  └──────────┘  └──────────┘  │
//! │                                                                         │
//! │  ┌──────────┐  ┌────────────────────────────────────────────────────┐  │
//! │  │   api    │  │ views: login, dashboard, pos, products,            │  │
//! │  │ reqwest  │  │        product detail, not found, error            │  │
//! │  └──────────┘  └────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod views;

#[cfg(test)]
mod testing;

pub use api::HttpApiClient;
pub use app::{App, ViewKind};
pub use config::{ShellConfig, StorageBackend};
pub use context::AppContext;
pub use error::{ShellError, ShellResult};
pub use host::{parse_command, Command, ConsoleHost};
