use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::domain::Domain;
use crate::error::Result;
use crate::models::{SaleOrder, SaleOrderLine};
use crate::odoo::{decode_records, ObjectRpc, WriteDate};

const MODEL: &str = "sale.order";
const MODEL_LINE: &str = "sale.order.line";
const FIELDS: &[&str] = &[
    "id",
    "name",
    "company_id",
    "partner_id",
    "partner_invoice_id",
    "partner_shipping_id",
    "state",
    "date_order",
    "invoice_status",
    "amount_total",
    "shipping_weight",
    "order_line",
];
const FIELDS_LINE: &[&str] = &[
    "id",
    "order_id",
    "name",
    "currency_id",
    "order_partner_id",
    "salesman_id",
    "product_id",
    "product_template_id",
    "state",
    "product_uom",
    "product_uom_qty",
    "product_qty",
    "price_unit",
    "price_subtotal",
    "price_tax",
    "price_total",
    "qty_to_invoice",
    "qty_to_deliver",
    "product_type",
    "create_date",
    "is_delivery",
    "display_type",
    "discount",
];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QuotationLine {
    pub product_id: i64,
    pub product_uom_qty: f64,
    pub price_unit: f64,
}

/// A new quotation: a customer and its order lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Quotation {
    pub partner_id: i64,
    pub lines: Vec<QuotationLine>,
}

impl Quotation {
    /// Values for `sale.order.create`; each line is an x2many `(0, 0, values)` command.
    pub fn to_values(&self) -> Value {
        let lines: Vec<Value> = self.lines.iter().map(|l| json!([0, 0, l])).collect();
        json!({
            "partner_id": self.partner_id,
            "order_line": lines,
        })
    }
}

pub struct SalesOrderClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> SalesOrderClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        SalesOrderClient { rpc }
    }

    /// Order ids, leaving out orders owned by the given salespeople.
    pub async fn fetch_ids(&self, excluded_users: &[i64]) -> Result<Vec<i64>> {
        info!("fetching sale order ids");
        let domain = if excluded_users.is_empty() {
            Domain::new()
        } else {
            Domain::new().term("user_id", "not in", excluded_users.to_vec())
        };
        self.rpc.search(MODEL, &domain).await
    }

    pub async fn fetch_order_details(&self, ids: &[i64]) -> Result<Vec<SaleOrder>> {
        info!(count = ids.len(), "fetching sale order details");
        let value = self.rpc.read(MODEL, ids, FIELDS).await?;
        decode_records(MODEL, value)
    }

    pub async fn fetch_order_line_details(&self, ids: &[i64]) -> Result<Vec<SaleOrderLine>> {
        info!(count = ids.len(), "fetching sale order line details");
        let value = self.rpc.read(MODEL_LINE, ids, FIELDS_LINE).await?;
        decode_records(MODEL_LINE, value)
    }

    pub async fn fetch_order_write_dates(&self, ids: &[i64]) -> Result<Vec<WriteDate>> {
        self.rpc.fetch_write_dates(MODEL, ids).await
    }

    pub async fn create_quotation(&self, quotation: &Quotation) -> Result<i64> {
        info!(partner = quotation.partner_id, lines = quotation.lines.len(), "creating quotation");
        self.rpc.create(MODEL, quotation.to_values()).await
    }
}
