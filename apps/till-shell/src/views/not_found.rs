use async_trait::async_trait;
use till_core::RouteParams;
use till_view::{BaseView, View, ViewResult};

use crate::context::AppContext;

/// Shown for paths no route matches. `path` param is the missed path.
pub struct NotFoundView {
    base: BaseView,
}

impl NotFoundView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        NotFoundView {
            base: ctx.base_view("not-found", params),
        }
    }
}

#[async_trait]
impl View for NotFoundView {
    fn base(&self) -> &BaseView {
        &self.base
    }

    fn title(&self) -> Option<String> {
        Some("Page not found".into())
    }

    async fn render(&self) -> ViewResult<()> {
        let path = self.base.param("path").unwrap_or("this page");
        self.base
            .mount()
            .set_content(&format!("Page not found: {path}\n\nLinks: /"));
        Ok(())
    }
}
