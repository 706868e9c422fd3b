//! Sign-in form.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::{json, Value};
use till_core::{FieldRules, FormValidator, RouteParams};
use till_router::NavigateOptions;
use till_view::{ApiError, BaseView, View, ViewResult};
use tracing::{debug, info};

use crate::context::{form_fields, AppContext, SUBMIT_EVENT, TOKEN_KEY, USER_KEY};

pub const LOGIN_PATH: &str = "/auth/login";

/// `/login`. Posts credentials and stores the returned user and token.
///
/// A `next` parameter (from `/login?next=/pos`) is where the user lands
/// after signing in.
pub struct LoginView {
    inner: Arc<Login>,
}

struct Login {
    base: BaseView,
    ctx: AppContext,
    validator: FormValidator,
}

impl LoginView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        let validator = FormValidator::new()
            .field("username", FieldRules::new().required().min_length(3))
            .field("password", FieldRules::new().required().min_length(4));
        LoginView {
            inner: Arc::new(Login {
                base: ctx.base_view("login", params),
                ctx: ctx.clone(),
                validator,
            }),
        }
    }

    /// Validates and submits the form. `Ok(true)` once signed in.
    pub async fn submit(&self, fields: HashMap<String, String>) -> ViewResult<bool> {
        self.inner.submit(fields).await
    }
}

impl Login {
    async fn submit(&self, fields: HashMap<String, String>) -> ViewResult<bool> {
        let report = self.base.validate_form(&self.validator, &fields);
        if !report.is_valid() {
            return Ok(false);
        }

        let username = fields.get("username").cloned().unwrap_or_default();
        let body = json!({
            "username": username,
            "password": fields.get("password").cloned().unwrap_or_default(),
        });

        let response = match self.ctx.api.post(LOGIN_PATH, body).await {
            Ok(response) => response,
            Err(e) if e.is_unauthorized() => {
                debug!(%username, "Sign-in rejected");
                self.base
                    .mount()
                    .set_field_error("password", Some("Invalid username or password"));
                self.ctx.notifier.error("Invalid username or password");
                return Ok(false);
            }
            Err(e) => {
                self.ctx.notifier.error(&e.message);
                return Err(e.into());
            }
        };

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::new(502, "Sign-in response has no token"))?
            .to_string();
        let user = response
            .get("user")
            .cloned()
            .unwrap_or_else(|| json!({ "username": username }));

        self.ctx
            .state
            .batch_update([(USER_KEY, user.clone()), (TOKEN_KEY, Value::String(token))]);
        info!(%username, "Signed in");

        let display = user
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&username)
            .to_string();
        self.ctx.notifier.success(&format!("Welcome, {display}"));

        let next = self
            .base
            .param("next")
            .filter(|next| next.starts_with('/') && !next.starts_with("/login"))
            .unwrap_or("/")
            .to_string();
        self.ctx
            .router
            .navigate(&next, NavigateOptions::default().replace())
            .await;
        Ok(true)
    }
}

#[async_trait]
impl View for LoginView {
    fn base(&self) -> &BaseView {
        &self.inner.base
    }

    fn title(&self) -> Option<String> {
        Some("Sign in".into())
    }

    async fn on_init(&self) -> ViewResult<()> {
        let login: Weak<Login> = Arc::downgrade(&self.inner);
        self.inner
            .base
            .add_event_listener(&self.inner.ctx.document, SUBMIT_EVENT, move |payload| {
                let Some(login) = login.upgrade() else {
                    return;
                };
                let fields = form_fields(payload);
                let ctx = login.ctx.clone();
                ctx.spawn(async move {
                    if let Err(e) = login.submit(fields).await {
                        debug!(error = %e, "Sign-in failed");
                    }
                });
            });
        Ok(())
    }

    async fn render(&self) -> ViewResult<()> {
        self.inner.base.mount().set_content(
            "Sign in\n\
             ───────\n\
             submit username=<name> password=<password>",
        );
        Ok(())
    }
}
