//! Single product.

use async_trait::async_trait;
use serde_json::Value;
use till_core::RouteParams;
use till_view::{BaseView, View, ViewError, ViewResult};
use tracing::debug;

use super::{add_to_cart, format_money, pos::PRODUCTS_PATH, Product};
use crate::context::{action_of, AppContext, ACTION_EVENT};

/// `/products/:id`. `add` puts the product in the cart.
pub struct ProductDetailView {
    base: BaseView,
    ctx: AppContext,
}

impl ProductDetailView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        ProductDetailView {
            base: ctx.base_view("product-detail", params),
            ctx: ctx.clone(),
        }
    }

    fn product(&self) -> Option<Product> {
        self.base
            .local("product")
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[async_trait]
impl View for ProductDetailView {
    fn base(&self) -> &BaseView {
        &self.base
    }

    fn title(&self) -> Option<String> {
        self.base.param("id").map(|id| format!("Product {id}"))
    }

    async fn on_init(&self) -> ViewResult<()> {
        let id = self.base.param("id").unwrap_or_default();
        let body: Value = self.ctx.api.get(&format!("{PRODUCTS_PATH}/{id}")).await?;
        let product: Product = serde_json::from_value(body).map_err(|e| ViewError::Init {
            view: "product-detail".into(),
            reason: format!("unexpected product: {e}"),
        })?;
        if let Ok(value) = serde_json::to_value(&product) {
            self.base.set_local("product", value);
        }

        let ctx = self.ctx.clone();
        self.base
            .add_event_listener(&self.ctx.document, ACTION_EVENT, move |payload| {
                if let Some(("add", _)) = action_of(payload) {
                    add_to_cart(&ctx.state, &product);
                    ctx.notifier.info(&format!("{} added to cart", product.name));
                    debug!(sku = %product.sku, "Added from product page");
                }
            });
        Ok(())
    }

    async fn render(&self) -> ViewResult<()> {
        let content = match self.product() {
            Some(p) => format!(
                "{}\n──────\nSKU   : {}\nPrice : {}\n\nActions: add | Links: /products  /pos",
                p.name,
                p.sku,
                format_money(p.price_cents)
            ),
            None => "Product unavailable".to_string(),
        };
        self.base.mount().set_content(&content);
        Ok(())
    }
}
