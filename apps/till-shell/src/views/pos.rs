//! # Point of Sale
//!
//! The cart lives in the `cart` state key so it survives navigating away
//! and back. The view re-renders through a state subscription that it drops
//! on destroy.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  action          effect                                                 │
//! │  ──────          ──────                                                 │
//! │  add <sku>       +1 of the catalog item                                 │
//! │  remove <sku>    -1, line dropped at zero                               │
//! │  clear           empty cart                                             │
//! │  checkout        POST /sales, cart emptied, lastSale stored             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use till_core::RouteParams;
use till_store::{StateManager, Subscription};
use till_view::{BaseView, View, ViewError, ViewResult};
use tracing::{debug, info};

use super::{format_money, parse_products, Product};
use crate::context::{action_of, AppContext, ACTION_EVENT, CART_KEY, LAST_SALE_KEY};

pub const PRODUCTS_PATH: &str = "/products";
pub const SALES_PATH: &str = "/sales";

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub qty: u32,
}

/// Cart lines held in state. A missing or malformed cart is empty.
pub fn cart_lines(state: &StateManager) -> Vec<CartLine> {
    state.get::<Vec<CartLine>>(CART_KEY).ok().flatten().unwrap_or_default()
}

pub fn cart_total(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .map(|line| line.price_cents * i64::from(line.qty))
        .sum()
}

/// Adds one unit of `product` to the cart.
pub fn add_to_cart(state: &StateManager, product: &Product) {
    let mut lines = cart_lines(state);
    match lines.iter_mut().find(|line| line.sku == product.sku) {
        Some(line) => line.qty += 1,
        None => lines.push(CartLine {
            sku: product.sku.clone(),
            name: product.name.clone(),
            price_cents: product.price_cents,
            qty: 1,
        }),
    }
    write_cart(state, &lines);
}

fn write_cart(state: &StateManager, lines: &[CartLine]) {
    if let Ok(value) = serde_json::to_value(lines) {
        state.set_state(CART_KEY, value);
    }
}

fn render_cart(lines: &[CartLine]) -> String {
    let mut out = String::from("Point of Sale\n─────────────\n");
    if lines.is_empty() {
        out.push_str("(cart is empty)\n");
    }
    for line in lines {
        out.push_str(&format!(
            "{:>3} x {:<24} {:>10}\n",
            line.qty,
            line.name,
            format_money(line.price_cents * i64::from(line.qty))
        ));
    }
    out.push_str(&format!("Total: {}\n", format_money(cart_total(lines))));
    out.push_str("Actions: add <sku> | remove <sku> | clear | checkout");
    out
}

/// `/pos`.
pub struct PosView {
    inner: Arc<Pos>,
}

struct Pos {
    base: BaseView,
    ctx: AppContext,
    catalog: Mutex<Vec<Product>>,
    cart_sub: Mutex<Option<Subscription>>,
}

impl PosView {
    pub fn new(ctx: &AppContext, params: RouteParams) -> Self {
        PosView {
            inner: Arc::new(Pos {
                base: ctx.base_view("pos", params),
                ctx: ctx.clone(),
                catalog: Mutex::new(Vec::new()),
                cart_sub: Mutex::new(None),
            }),
        }
    }

    pub fn add_item(&self, sku: &str) -> ViewResult<()> {
        self.inner.add_item(sku)
    }

    pub fn remove_item(&self, sku: &str) {
        self.inner.remove_item(sku);
    }

    pub fn clear_cart(&self) {
        self.inner.clear_cart();
    }

    /// Posts the cart as a sale. `Ok(None)` if the cart was empty.
    pub async fn checkout(&self) -> ViewResult<Option<Value>> {
        self.inner.checkout().await
    }
}

impl Pos {
    fn add_item(&self, sku: &str) -> ViewResult<()> {
        let product = self
            .catalog
            .lock()
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(sku))
            .cloned();
        match product {
            Some(product) => {
                add_to_cart(&self.ctx.state, &product);
                debug!(sku = %product.sku, "Item added");
                Ok(())
            }
            None => {
                self.ctx.notifier.warning(&format!("Unknown item: {sku}"));
                Err(ViewError::Validation(format!("unknown sku {sku}")))
            }
        }
    }

    fn remove_item(&self, sku: &str) {
        let mut lines = cart_lines(&self.ctx.state);
        if let Some(index) = lines.iter().position(|l| l.sku.eq_ignore_ascii_case(sku)) {
            if lines[index].qty > 1 {
                lines[index].qty -= 1;
            } else {
                lines.remove(index);
            }
            write_cart(&self.ctx.state, &lines);
        }
    }

    fn clear_cart(&self) {
        write_cart(&self.ctx.state, &[]);
    }

    async fn checkout(&self) -> ViewResult<Option<Value>> {
        let lines = cart_lines(&self.ctx.state);
        if lines.is_empty() {
            self.ctx.notifier.warning("Cart is empty");
            return Ok(None);
        }

        let total = cart_total(&lines);
        let body = json!({ "lines": lines, "total_cents": total });
        let sale = match self.ctx.api.post(SALES_PATH, body).await {
            Ok(sale) => sale,
            Err(e) => {
                self.ctx.notifier.error(&format!("Sale failed: {}", e.message));
                return Err(e.into());
            }
        };

        self.ctx
            .state
            .batch_update([(CART_KEY, json!([])), (LAST_SALE_KEY, sale.clone())]);
        info!(total_cents = total, lines = lines.len(), "Sale completed");
        self.ctx
            .notifier
            .success(&format!("Sale completed: {}", format_money(total)));
        Ok(Some(sale))
    }

    fn handle_action(self: &Arc<Self>, payload: &Value) {
        let Some((name, args)) = action_of(payload) else {
            return;
        };
        match (name, args.first()) {
            ("add", Some(sku)) => {
                let _ = self.add_item(sku);
            }
            ("remove", Some(sku)) => self.remove_item(sku),
            ("clear", _) => self.clear_cart(),
            ("checkout", _) => {
                let pos = self.clone();
                self.ctx.spawn(async move {
                    if let Err(e) = pos.checkout().await {
                        debug!(error = %e, "Checkout failed");
                    }
                });
            }
            _ => debug!(action = name, "Unknown POS action"),
        }
    }
}

#[async_trait]
impl View for PosView {
    fn base(&self) -> &BaseView {
        &self.inner.base
    }

    fn title(&self) -> Option<String> {
        Some("Point of Sale".into())
    }

    async fn on_init(&self) -> ViewResult<()> {
        let products = self.inner.ctx.api.get(PRODUCTS_PATH).await?;
        *self.inner.catalog.lock() = parse_products("pos", products)?;

        let mount = self.inner.base.mount().clone();
        let sub = self.inner.ctx.state.subscribe(CART_KEY, move |new, _old| {
            let lines: Vec<CartLine> = new
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            mount.set_content(&render_cart(&lines));
        });
        *self.inner.cart_sub.lock() = Some(sub);

        let pos: Weak<Pos> = Arc::downgrade(&self.inner);
        self.inner
            .base
            .add_event_listener(&self.inner.ctx.document, ACTION_EVENT, move |payload| {
                if let Some(pos) = pos.upgrade() {
                    pos.handle_action(payload);
                }
            });
        Ok(())
    }

    async fn render(&self) -> ViewResult<()> {
        self.inner
            .base
            .mount()
            .set_content(&render_cart(&cart_lines(&self.inner.ctx.state)));
        Ok(())
    }

    fn on_destroy(&self) -> ViewResult<()> {
        if let Some(sub) = self.inner.cart_sub.lock().take() {
            sub.unsubscribe();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coke() -> Product {
        Product {
            id: "1".into(),
            sku: "COKE".into(),
            name: "Coke 500ml".into(),
            price_cents: 150,
        }
    }

    #[test]
    fn test_cart_accumulates_quantity() {
        let state = StateManager::in_memory();
        add_to_cart(&state, &coke());
        add_to_cart(&state, &coke());

        let lines = cart_lines(&state);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 2);
        assert_eq!(cart_total(&lines), 300);
    }

    #[test]
    fn test_malformed_cart_reads_as_empty() {
        let state = StateManager::in_memory();
        state.set_state(CART_KEY, json!("not a cart"));
        assert!(cart_lines(&state).is_empty());
        assert!(render_cart(&[]).contains("(cart is empty)"));
    }
}
