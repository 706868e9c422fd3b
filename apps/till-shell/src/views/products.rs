//! Product catalog listing.

use async_trait::async_trait;
use till_core::RouteParams;
use till_router::NavigateOptions;
use till_view::{BaseView, View, ViewResult};
use tracing::warn;

use super::{format_money, parse_products, pos::PRODUCTS_PATH, Product};
use crate::context::{action_of, AppContext, ACTION_EVENT};

/// `/products`. `open <id>` shows a product.
pub struct ProductsView {
    base: BaseView,
    ctx: AppContext,
}

impl ProductsView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        ProductsView {
            base: ctx.base_view("products", params),
            ctx: ctx.clone(),
        }
    }
}

fn render_list(products: &[Product]) -> String {
    let mut out = String::from("Products\n────────\n");
    if products.is_empty() {
        out.push_str("(no products)\n");
    }
    for product in products {
        out.push_str(&format!(
            "{:<10} {:<24} {:>10}  /products/{}\n",
            product.sku,
            product.name,
            format_money(product.price_cents),
            product.id
        ));
    }
    out.push_str("Actions: open <id>");
    out
}

#[async_trait]
impl View for ProductsView {
    fn base(&self) -> &BaseView {
        &self.base
    }

    fn title(&self) -> Option<String> {
        Some("Products".into())
    }

    async fn on_init(&self) -> ViewResult<()> {
        let products = parse_products("products", self.ctx.api.get(PRODUCTS_PATH).await?)?;
        self.base.set_local("products", serde_json::to_value(&products).unwrap_or_default());

        let ctx = self.ctx.clone();
        self.base
            .add_event_listener(&self.ctx.document, ACTION_EVENT, move |payload| {
                let Some(("open", args)) = action_of(payload) else {
                    return;
                };
                let Some(id) = args.first() else {
                    return;
                };
                let params = RouteParams::from([("id".to_string(), id.to_string())]);
                match ctx.router.url_for("product", &params) {
                    Ok(path) => {
                        let router = ctx.router.clone();
                        ctx.spawn(async move {
                            router.navigate(&path, NavigateOptions::default()).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "Cannot open product"),
                }
            });
        Ok(())
    }

    async fn render(&self) -> ViewResult<()> {
        let products: Vec<Product> = self
            .base
            .local("products")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        self.base.mount().set_content(&render_list(&products));
        Ok(())
    }
}
