//! Report shaping: fetched records flattened into rows for display and export.

mod catalog;
mod purchase;
mod sales;
mod stock;

pub use catalog::{product_rows, products_report, template_rows, templates_report, ProductRow, TemplateRow};
pub use purchase::{
    purchase_line_rows, purchase_order_rows, purchase_report, PurchaseLineRow, PurchaseOrderRow,
    PurchaseReport,
};
pub use sales::{sale_line_rows, sale_order_rows, sales_report, SaleLineRow, SaleOrderRow, SalesReport};
pub use stock::{quant_rows, quants_report, QuantRow};

use chrono::NaiveDateTime;
use tracing::warn;

use crate::models::internal_reference;
use crate::odoo::Many2one;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?;
    match NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT) {
        Ok(dt) => Some(dt),
        Err(e) => {
            warn!(value = raw, error = %e, "unparsable datetime");
            None
        }
    }
}

/// Bracketed reference of a product label, or an empty string (logged) when absent.
pub(crate) fn reference_or_empty(product_name: &str) -> String {
    match internal_reference(product_name) {
        Some(r) => r.to_string(),
        None => {
            warn!(product = product_name, "no internal reference in product name");
            String::new()
        }
    }
}

pub(crate) fn name_of(field: &Option<Many2one>) -> String {
    field.as_ref().map(|m| m.name().to_string()).unwrap_or_default()
}

/// Line ids across all orders, deduplicated, in first-seen order.
pub(crate) fn collect_line_ids<'a>(lines: impl Iterator<Item = &'a Vec<i64>>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for id in lines.flatten() {
        if seen.insert(*id) {
            ids.push(*id);
        }
    }
    ids
}

pub(crate) const NOTE_LINE: &str = "line_note";
