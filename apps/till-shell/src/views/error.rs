use async_trait::async_trait;
use till_core::RouteParams;
use till_view::{BaseView, View, ViewResult};

use crate::context::AppContext;

/// Fallback screen after a failed navigation. `message` param is shown.
pub struct ErrorView {
    base: BaseView,
}

impl ErrorView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        ErrorView {
            base: ctx.base_view("error", params),
        }
    }
}

#[async_trait]
impl View for ErrorView {
    fn base(&self) -> &BaseView {
        &self.base
    }

    fn title(&self) -> Option<String> {
        Some("Error".into())
    }

    async fn render(&self) -> ViewResult<()> {
        let message = self.base.param("message").unwrap_or("Unknown error");
        self.base
            .mount()
            .set_content(&format!("Something went wrong\n\n{message}\n\nLinks: /"));
        Ok(())
    }
}
