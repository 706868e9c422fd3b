//! # till-router: Client-Side Router
//!
//! Maps navigation targets to async handlers, keeps a host history stack in
//! sync and runs every navigation through an ordered middleware pipeline.
//!
//! ## Module Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          till-router                                    │
//! │                                                                         │
//! │  ┌───────────┐  ┌─────────────┐  ┌───────────┐  ┌──────────────────┐   │
//! │  │  router   │  │ middleware  │  │  history  │  │      link        │   │
//! │  │           │  │             │  │           │  │                  │   │
//! │  │ Router    │  │ Flow        │  │ Host trait│  │ LinkClick        │   │
//! │  │ navigate  │  │ Context     │  │ Memory    │  │ same-origin +    │   │
//! │  │ start     │  │ from_fn     │  │ PopState  │  │ modifier filter  │   │
//! │  └───────────┘  └─────────────┘  └───────────┘  └──────────────────┘   │
//! │                                                                         │
//! │  ┌───────────┐  ┌─────────────┐                                        │
//! │  │   route   │  │    error    │                                        │
//! │  │ Options   │  │ RouterError │                                        │
//! │  │ Match     │  │             │                                        │
//! │  └───────────┘  └─────────────┘                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Route Precedence
//! First registered, first matched. `/users/:id` registered before
//! `/users/me` captures `/users/me` with `id = "me"`; register the literal
//! first if it should win.

pub mod error;
pub mod history;
pub mod link;
pub mod middleware;
pub mod route;
pub mod router;

pub use error::{BoxError, RouterError, RouterResult};
pub use history::{HistoryEntry, HistoryHost, MemoryHistory, PopState};
pub use link::LinkClick;
pub use middleware::{from_fn, Flow, FnMiddleware, Middleware, NavigationContext};
pub use route::{RouteChange, RouteMatch, RouteOptions, RouteRequest};
pub use router::{
    NavigateOptions, NavigationLogEntry, NavigationOutcome, Router, RouterConfig, MAX_REDIRECT_DEPTH,
};
