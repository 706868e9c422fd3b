//! Sales summary, refreshed while the view is shown.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use till_core::RouteParams;
use till_view::{BaseView, View, ViewResult};
use tracing::warn;

use super::format_money;
use crate::context::{AppContext, USER_KEY};

pub const SUMMARY_PATH: &str = "/sales/summary";
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// `/`. Today's totals for the signed-in cashier.
pub struct DashboardView {
    base: BaseView,
    ctx: AppContext,
}

impl DashboardView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        DashboardView {
            base: ctx.base_view("dashboard", params),
            ctx: ctx.clone(),
        }
    }

    fn cashier(&self) -> String {
        self.ctx
            .state
            .get_state(USER_KEY)
            .and_then(|user| {
                user.get("name")
                    .or_else(|| user.get("username"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "cashier".to_string())
    }
}

fn render_summary(cashier: &str, summary: &Value) -> String {
    let count = summary.get("sales_count").and_then(Value::as_u64).unwrap_or(0);
    let revenue = summary.get("revenue_cents").and_then(Value::as_i64).unwrap_or(0);
    format!(
        "Dashboard ({cashier})\n\
         ─────────\n\
         Sales today : {count}\n\
         Revenue     : {}\n\
         \n\
         Links: /pos  /products  /logout",
        format_money(revenue)
    )
}

#[async_trait]
impl View for DashboardView {
    fn base(&self) -> &BaseView {
        &self.base
    }

    fn title(&self) -> Option<String> {
        Some("Dashboard".into())
    }

    async fn on_init(&self) -> ViewResult<()> {
        let summary = self.ctx.api.get(SUMMARY_PATH).await?;
        self.base.set_local("summary", summary);

        let api = self.ctx.api.clone();
        let mount = self.base.mount().clone();
        let cashier = self.cashier();
        self.base.set_interval(REFRESH_INTERVAL, move || {
            let api = api.clone();
            let mount = mount.clone();
            let cashier = cashier.clone();
            async move {
                match api.get(SUMMARY_PATH).await {
                    Ok(summary) => mount.set_content(&render_summary(&cashier, &summary)),
                    Err(e) => warn!(error = %e, "Dashboard refresh failed"),
                }
            }
        });
        Ok(())
    }

    async fn render(&self) -> ViewResult<()> {
        let summary = self.base.local("summary").unwrap_or(Value::Null);
        self.base
            .mount()
            .set_content(&render_summary(&self.cashier(), &summary));
        Ok(())
    }
}
