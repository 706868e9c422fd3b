//! # till-view: View Lifecycle Contract
//!
//! Everything a navigable screen needs, independent of any concrete UI.
//!
//! ## Module Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           till-view                                     │
//! │                                                                         │
//! │  ┌────────────┐  ┌────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │    view    │  │    base    │  │  resources  │  │     event       │  │
//! │  │ View trait │  │ BaseView   │  │ listeners   │  │ EventTarget     │  │
//! │  │ Instance   │  │ Lifecycle  │  │ timeouts    │  │ ListenerId      │  │
//! │  │            │  │ validate   │  │ intervals   │  │                 │  │
//! │  └────────────┘  └────────────┘  └─────────────┘  └─────────────────┘  │
//! │                                                                         │
//! │  ┌────────────┐  ┌────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │   mount    │  │  registry  │  │   notify    │  │      api        │  │
//! │  │ MountPoint │  │ enum key → │  │ Notifier    │  │ ApiClient       │  │
//! │  │ MemoryMount│  │ factory    │  │ toasts      │  │ MemoryApi       │  │
//! │  └────────────┘  └────────────┘  └─────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use till_core::{NoopChrome, RouteParams};
//! use till_view::{BaseView, MemoryMount, MountPoint, View, ViewInstance, ViewResult};
//!
//! struct Hello {
//!     base: BaseView,
//! }
//!
//! #[async_trait]
//! impl View for Hello {
//!     fn base(&self) -> &BaseView {
//!         &self.base
//!     }
//!
//!     async fn render(&self) -> ViewResult<()> {
//!         self.base.mount().set_content("hello");
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ViewResult<()> {
//! let mount = Arc::new(MemoryMount::new());
//! let view = ViewInstance::new(Hello {
//!     base: BaseView::new("hello", mount.clone(), Arc::new(NoopChrome), RouteParams::new()),
//! });
//! view.mount().await?;
//! assert_eq!(mount.content(), "hello");
//! view.destroy();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod base;
pub mod error;
pub mod event;
pub mod mount;
pub mod notify;
pub mod registry;
pub mod resources;
pub mod view;

pub use api::{ApiClient, MemoryApi, Method, RecordedRequest};
pub use base::{BaseView, Lifecycle};
pub use error::{ApiError, ViewError, ViewResult};
pub use event::{EventTarget, Listener, ListenerId};
pub use mount::{MemoryMount, MountPoint};
pub use notify::{NotificationCenter, NotificationConfig, Notifier, Toast, ToastLevel};
pub use registry::{ViewFactory, ViewRegistry};
pub use resources::TimerId;
pub use view::{View, ViewInstance};
