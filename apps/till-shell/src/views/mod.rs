//! # Screens
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route               View                 Data                          │
//! │  ─────               ────                 ────                          │
//! │  /login              LoginView            POST /auth/login              │
//! │  /                   DashboardView        GET  /sales/summary (polled)  │
//! │  /pos                PosView              GET  /products, POST /sales   │
//! │  /products           ProductsView         GET  /products                │
//! │  /products/:id       ProductDetailView    GET  /products/:id            │
//! │  (no match)          NotFoundView         -                             │
//! │  (handler failure)   ErrorView            -                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod dashboard;
mod error;
mod login;
mod not_found;
mod pos;
mod product_detail;
mod products;

pub use dashboard::{DashboardView, REFRESH_INTERVAL, SUMMARY_PATH};
pub use error::ErrorView;
pub use login::LoginView;
pub use not_found::NotFoundView;
pub use pos::{add_to_cart, cart_lines, cart_total, CartLine, PosView};
pub use product_detail::ProductDetailView;
pub use products::ProductsView;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use till_view::{ViewError, ViewResult};

/// Catalog entry as served by `/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
}

/// Parses a `/products` response.
pub(crate) fn parse_products(view: &str, body: Value) -> ViewResult<Vec<Product>> {
    serde_json::from_value(body).map_err(|e| ViewError::Init {
        view: view.to_string(),
        reason: format!("unexpected product list: {e}"),
    })
}

/// `1250` → `"12.50"`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(1250), "12.50");
        assert_eq!(format_money(-105), "-1.05");
    }
}
