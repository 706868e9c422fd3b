//! # App
//!
//! Owns the view registry and the current view, and registers the routes.
//!
//! ## Showing a View
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  route handler ──► App::show(kind, params)                              │
//! │                      │                                                  │
//! │                      ├─ previous view destroyed                         │
//! │                      ├─ registry.create(kind) ──► ViewInstance          │
//! │                      ├─ mount() ── Ok ──► becomes current               │
//! │                      │          └─ Err ─► destroyed, Err to the router  │
//! │                      ▼                                                  │
//! │  router error handler                                                   │
//! │      401 from the API ──► session expired, → /login                     │
//! │      anything else    ──► error toast + ErrorView                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use till_core::RouteParams;
use till_router::{BoxError, RouteOptions, RouteRequest, Router, RouterError};
use till_view::{ApiError, ViewError, ViewInstance, ViewRegistry, ViewResult};
use tracing::{debug, error, info};

use crate::auth::{GuestOnly, Logout, RequireAuth};
use crate::context::AppContext;
use crate::error::ShellResult;
use crate::views::{
    DashboardView, ErrorView, LoginView, NotFoundView, PosView, ProductDetailView, ProductsView,
};

/// Every screen the shell can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Login,
    Dashboard,
    Pos,
    Products,
    ProductDetail,
    NotFound,
    Error,
}

fn registry() -> ViewRegistry<ViewKind, AppContext> {
    let mut registry = ViewRegistry::new();
    registry
        .register(ViewKind::Login, LoginView::new)
        .register(ViewKind::Dashboard, DashboardView::new)
        .register(ViewKind::Pos, PosView::new)
        .register(ViewKind::Products, ProductsView::new)
        .register(ViewKind::ProductDetail, ProductDetailView::new)
        .register(ViewKind::NotFound, NotFoundView::new)
        .register(ViewKind::Error, ErrorView::new);
    registry
}

/// The application: context, registry and current view.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    ctx: AppContext,
    registry: ViewRegistry<ViewKind, AppContext>,
    current: Mutex<Option<(ViewKind, ViewInstance)>>,
}

impl App {
    /// Builds the app and registers its routes on `ctx.router`.
    pub fn new(ctx: AppContext) -> ShellResult<Self> {
        let app = App {
            inner: Arc::new(AppInner {
                ctx,
                registry: registry(),
                current: Mutex::new(None),
            }),
        };
        app.install_routes()?;
        Ok(app)
    }

    pub fn context(&self) -> &AppContext {
        &self.inner.ctx
    }

    pub fn router(&self) -> &Router {
        &self.inner.ctx.router
    }

    /// The view currently shown.
    pub fn current_view(&self) -> Option<(ViewKind, ViewInstance)> {
        self.inner.current.lock().clone()
    }

    pub fn current_kind(&self) -> Option<ViewKind> {
        self.inner.current.lock().as_ref().map(|(kind, _)| *kind)
    }

    /// Replaces the current view with a fresh `kind`.
    ///
    /// On failure nothing is current and the mount is empty.
    pub async fn show(&self, kind: ViewKind, params: RouteParams) -> ViewResult<()> {
        let previous = self.inner.current.lock().take();
        if let Some((previous_kind, view)) = previous {
            debug!(view = ?previous_kind, "Destroying previous view");
            view.destroy();
        }

        let view = self.inner.registry.create(kind, &self.inner.ctx, params)?;
        match view.mount().await {
            Ok(()) => {
                info!(view = ?kind, "View shown");
                *self.inner.current.lock() = Some((kind, view));
                Ok(())
            }
            Err(e) => {
                view.destroy();
                Err(e)
            }
        }
    }

    /// Shuts down the current view and the router.
    pub fn shutdown(&self) {
        let current = self.inner.current.lock().take();
        if let Some((_, view)) = current {
            view.destroy();
        }
        self.router().stop();
    }

    // =========================================================================
    // Routes
    // =========================================================================

    fn install_routes(&self) -> ShellResult<()> {
        let ctx = &self.inner.ctx;
        let router = &ctx.router;
        let auth = RequireAuth::new(ctx.state.clone());

        router.add_route(
            "/login",
            self.view_handler(ViewKind::Login),
            RouteOptions::new()
                .name("login")
                .title("Sign in")
                .middleware(GuestOnly::new(ctx.state.clone())),
        )?;
        router.add_route(
            "/logout",
            |_req: RouteRequest| async { Ok::<(), BoxError>(()) },
            RouteOptions::new()
                .name("logout")
                .middleware(Logout::new(ctx.state.clone(), ctx.notifier.clone())),
        )?;
        router.add_route(
            "/",
            self.view_handler(ViewKind::Dashboard),
            RouteOptions::new()
                .name("dashboard")
                .title("Dashboard")
                .middleware(auth.clone()),
        )?;
        router.add_route(
            "/pos",
            self.view_handler(ViewKind::Pos),
            RouteOptions::new()
                .name("pos")
                .title("Point of Sale")
                .middleware(auth.clone()),
        )?;
        router.add_route(
            "/products",
            self.view_handler(ViewKind::Products),
            RouteOptions::new()
                .name("products")
                .title("Products")
                .middleware(auth.clone()),
        )?;
        router.add_route(
            "/products/:id",
            self.view_handler(ViewKind::ProductDetail),
            RouteOptions::new()
                .name("product")
                .title("Product")
                .middleware(auth),
        )?;

        let app = self.clone();
        router.on_not_found(move |req: RouteRequest| {
            let app = app.clone();
            async move {
                let params = RouteParams::from([("path".to_string(), req.path)]);
                app.show(ViewKind::NotFound, params)
                    .await
                    .map_err(BoxError::from)
            }
        });

        let app = self.clone();
        router.on_error(move |err| {
            let app = app.clone();
            async move { app.handle_error(err).await }
        });

        debug!(routes = ?router.routes(), "Routes installed");
        Ok(())
    }

    /// Route handler that shows `kind`.
    ///
    /// The login view also receives the `next` query parameter.
    fn view_handler(
        &self,
        kind: ViewKind,
    ) -> impl Fn(RouteRequest) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync + 'static {
        let app = self.clone();
        move |req: RouteRequest| -> BoxFuture<'static, Result<(), BoxError>> {
            let app = app.clone();
            Box::pin(async move {
                let mut params = req.params;
                if kind == ViewKind::Login {
                    if let Some(next) = req.query.get("next") {
                        params.insert("next".to_string(), next.clone());
                    }
                }
                app.show(kind, params).await.map_err(BoxError::from)
            })
        }
    }

    async fn handle_error(&self, err: RouterError) {
        let ctx = &self.inner.ctx;
        if unauthorized(&err) {
            ctx.expire_session().await;
            return;
        }

        error!(error = %err, path = ?err.path(), "Navigation failed");
        ctx.notifier.error(&user_message(&err));

        let params = RouteParams::from([("message".to_string(), err.to_string())]);
        if let Err(e) = self.show(ViewKind::Error, params).await {
            error!(error = %e, "Error view failed to show");
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("current", &self.current_kind())
            .finish_non_exhaustive()
    }
}

fn api_error(err: &RouterError) -> Option<&ApiError> {
    match err {
        RouterError::Handler { source, .. } => source.downcast_ref::<ViewError>().and_then(ViewError::api),
        _ => None,
    }
}

fn unauthorized(err: &RouterError) -> bool {
    api_error(err).is_some_and(ApiError::is_unauthorized)
}

fn user_message(err: &RouterError) -> String {
    match api_error(err) {
        Some(api) if api.status == 0 => "Server unreachable. Please try again.".to_string(),
        Some(api) => api.message.clone(),
        None => match err {
            RouterError::RedirectLoop(_) => "Navigation stopped: too many redirects".to_string(),
            _ => "Something went wrong".to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
