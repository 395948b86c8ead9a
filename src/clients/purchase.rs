use tracing::info;

use crate::domain::Domain;
use crate::error::Result;
use crate::models::{PurchaseOrder, PurchaseOrderLine};
use crate::odoo::{decode_records, ObjectRpc};

const MODEL: &str = "purchase.order";
const MODEL_LINE: &str = "purchase.order.line";
const FIELDS: &[&str] = &[
    "id",
    "name",
    "company_id",
    "partner_id",
    "state",
    "date_order",
    "invoice_status",
    "order_line",
];
const FIELDS_LINE: &[&str] = &[
    "id",
    "order_id",
    "name",
    "currency_id",
    "partner_id",
    "state",
    "product_uom",
    "product_uom_qty",
    "product_qty",
    "price_unit",
    "price_subtotal",
    "price_tax",
    "price_total",
    "qty_to_invoice",
    "qty_received",
    "date_order",
    "product_type",
    "create_date",
    "display_type",
    "discount",
];

pub struct PurchaseOrderClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> PurchaseOrderClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        PurchaseOrderClient { rpc }
    }

    /// Order ids, leaving out orders placed with the given vendors.
    pub async fn fetch_ids(&self, excluded_partners: &[i64]) -> Result<Vec<i64>> {
        info!("fetching purchase order ids");
        let domain = if excluded_partners.is_empty() {
            Domain::new()
        } else {
            Domain::new().term("partner_id", "not in", excluded_partners.to_vec())
        };
        self.rpc.search(MODEL, &domain).await
    }

    pub async fn fetch_order_details(&self, ids: &[i64]) -> Result<Vec<PurchaseOrder>> {
        let value = self.rpc.read(MODEL, ids, FIELDS).await?;
        decode_records(MODEL, value)
    }

    pub async fn fetch_order_line_details(&self, ids: &[i64]) -> Result<Vec<PurchaseOrderLine>> {
        let value = self.rpc.read(MODEL_LINE, ids, FIELDS_LINE).await?;
        decode_records(MODEL_LINE, value)
    }
}
