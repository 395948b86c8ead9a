use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::{collect_line_ids, name_of, parse_datetime, reference_or_empty, NOTE_LINE};
use crate::clients::PurchaseOrderClient;
use crate::error::Result;
use crate::export::{float, TableRow};
use crate::models::{PurchaseOrder, PurchaseOrderLine};
use crate::odoo::ObjectRpc;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PurchaseOrderRow {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub partner: String,
    pub state: String,
    pub date_order: String,
    pub invoice_status: String,
    pub orderline_ids: Vec<i64>,
}

impl TableRow for PurchaseOrderRow {
    fn headers() -> Vec<&'static str> {
        vec!["Order", "Vendor", "State", "Date", "Invoice status", "Lines"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.partner.clone(),
            self.state.clone(),
            self.date_order.clone(),
            self.invoice_status.clone(),
            self.orderline_ids.len().to_string(),
        ]
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PurchaseLineRow {
    pub order_number: String,
    pub product_name: String,
    pub internal_reference: String,
    pub currency: String,
    pub order_partner: String,
    pub state: String,
    pub uom: String,
    pub product_uom_qty: f64,
    pub product_qty: f64,
    pub price_unit: f64,
    pub price_subtotal: f64,
    pub price_tax: f64,
    pub price_total: f64,
    pub qty_to_invoice: f64,
    pub qty_received: f64,
    pub date_order: String,
    pub product_type: String,
    pub create_date: Option<NaiveDateTime>,
    pub discount: f64,
}

impl TableRow for PurchaseLineRow {
    fn headers() -> Vec<&'static str> {
        vec!["Order", "Reference", "Vendor", "Qty", "Received", "Unit price"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.order_number.clone(),
            self.internal_reference.clone(),
            self.order_partner.clone(),
            float(self.product_qty),
            float(self.qty_received),
            float(self.price_unit),
        ]
    }
}

pub struct PurchaseReport {
    pub orders: Vec<PurchaseOrderRow>,
    pub line_ids: Vec<i64>,
    pub lines: Vec<PurchaseLineRow>,
}

pub fn purchase_order_rows(orders: &[PurchaseOrder]) -> (Vec<PurchaseOrderRow>, Vec<i64>) {
    let rows = orders
        .iter()
        .map(|od| PurchaseOrderRow {
            id: od.id,
            name: od.name.clone(),
            company: name_of(&od.company_id),
            partner: name_of(&od.partner_id),
            state: od.state.clone(),
            date_order: od.date_order.clone().unwrap_or_default(),
            invoice_status: od.invoice_status.clone().unwrap_or_default(),
            orderline_ids: od.order_line.clone(),
        })
        .collect();
    let line_ids = collect_line_ids(orders.iter().map(|od| &od.order_line));
    (rows, line_ids)
}

/// Purchase lines carry the product label in `name`; note lines are dropped.
pub fn purchase_line_rows(lines: Vec<PurchaseOrderLine>) -> Vec<PurchaseLineRow> {
    let mut rows: Vec<PurchaseLineRow> = lines
        .into_iter()
        .filter(|l| l.display_type.as_deref() != Some(NOTE_LINE))
        .filter_map(|line| {
            let Some(order) = &line.order_id else {
                warn!(line = line.id, "purchase order line without order, skipped");
                return None;
            };
            Some(PurchaseLineRow {
                order_number: order.name().to_string(),
                internal_reference: reference_or_empty(&line.name),
                product_name: line.name.clone(),
                currency: name_of(&line.currency_id),
                order_partner: name_of(&line.partner_id),
                state: line.state.clone(),
                uom: name_of(&line.product_uom),
                product_uom_qty: line.product_uom_qty,
                product_qty: line.product_qty,
                price_unit: line.price_unit,
                price_subtotal: line.price_subtotal,
                price_tax: line.price_tax,
                price_total: line.price_total,
                qty_to_invoice: line.qty_to_invoice,
                qty_received: line.qty_received,
                date_order: line.date_order.clone().unwrap_or_default(),
                product_type: line.product_type.clone().unwrap_or_default(),
                create_date: parse_datetime(line.create_date.as_deref()),
                discount: line.discount,
            })
        })
        .collect();
    rows.sort_by_key(|r| r.create_date);
    rows
}

pub async fn purchase_report<C: ObjectRpc>(
    rpc: &C,
    excluded_partners: &[i64],
) -> Result<PurchaseReport> {
    let client = PurchaseOrderClient::new(rpc);
    let ids = client.fetch_ids(excluded_partners).await?;
    let orders = client.fetch_order_details(&ids).await?;
    let (orders, line_ids) = purchase_order_rows(&orders);
    let lines = purchase_line_rows(client.fetch_order_line_details(&line_ids).await?);
    info!(orders = orders.len(), lines = lines.len(), "purchase report ready");
    Ok(PurchaseReport {
        orders,
        line_ids,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odoo::mock::MockRpc;
    use serde_json::json;

    #[tokio::test]
    async fn vendors_are_excluded_and_lines_shaped() {
        let rpc = MockRpc::new()
            .reply("purchase.order", "search", json!([4]))
            .reply(
                "purchase.order",
                "read",
                json!([{"id": 4, "name": "P00004", "partner_id": [12, "Supplier"], "state": "purchase", "order_line": [7, 8]}]),
            )
            .reply(
                "purchase.order.line",
                "read",
                json!([
                    {"id": 7, "order_id": [4, "P00004"], "name": "[BOLT-5] Bolt", "partner_id": [12, "Supplier"],
                     "state": "purchase", "product_qty": 100.0, "qty_received": 40.0,
                     "create_date": "2024-02-01 08:00:00", "display_type": false},
                    {"id": 8, "order_id": [4, "P00004"], "name": "Call before delivery",
                     "state": "purchase", "display_type": "line_note"}
                ]),
            );
        let report = purchase_report(&rpc, &[39, 316]).await.unwrap();
        assert_eq!(
            rpc.calls_to("purchase.order", "search")[0].args,
            json!([[["partner_id", "not in", [39, 316]]]])
        );
        assert_eq!(report.orders[0].partner, "Supplier");
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].internal_reference, "BOLT-5");
        assert_eq!(report.lines[0].qty_received, 40.0);
    }
}
