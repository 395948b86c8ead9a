use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::{collect_line_ids, name_of, parse_datetime, reference_or_empty, NOTE_LINE};
use crate::clients::SalesOrderClient;
use crate::error::Result;
use crate::export::{float, TableRow};
use crate::models::{SaleOrder, SaleOrderLine};
use crate::odoo::ObjectRpc;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SaleOrderRow {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub partner: String,
    pub state: String,
    pub date_order: String,
    pub invoice_status: String,
    pub shipping_weight: f64,
    pub orderline_ids: Vec<i64>,
}

impl TableRow for SaleOrderRow {
    fn headers() -> Vec<&'static str> {
        vec!["Order", "Partner", "State", "Date", "Invoice status", "Lines"]
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
pub struct SaleLineRow {
    pub order_number: String,
    pub product_name: String,
    pub product_id: i64,
    pub internal_reference: String,
    pub currency: String,
    pub order_partner: String,
    pub salesman: String,
    pub state: String,
    pub uom: String,
    pub product_uom_qty: f64,
    pub product_qty: f64,
    pub price_unit: f64,
    pub price_subtotal: f64,
    pub price_tax: f64,
    pub price_total: f64,
    pub qty_to_invoice: f64,
    pub qty_to_deliver: f64,
    pub product_type: String,
    pub create_date: Option<NaiveDateTime>,
    pub is_delivery: bool,
    pub discount: f64,
}

impl TableRow for SaleLineRow {
    fn headers() -> Vec<&'static str> {
        vec!["Order", "Reference", "Customer", "Qty", "Unit price", "Total"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.order_number.clone(),
            self.internal_reference.clone(),
            self.order_partner.clone(),
            float(self.product_uom_qty),
            float(self.price_unit),
            float(self.price_total),
        ]
    }
}

pub struct SalesReport {
    pub orders: Vec<SaleOrderRow>,
    pub line_ids: Vec<i64>,
    pub lines: Vec<SaleLineRow>,
}

pub fn sale_order_rows(orders: &[SaleOrder]) -> (Vec<SaleOrderRow>, Vec<i64>) {
    let rows = orders
        .iter()
        .map(|od| SaleOrderRow {
            id: od.id,
            name: od.name.clone(),
            company: name_of(&od.company_id),
            partner: name_of(&od.partner_id),
            state: od.state.clone(),
            date_order: od.date_order.clone().unwrap_or_default(),
            invoice_status: od.invoice_status.clone().unwrap_or_default(),
            shipping_weight: od.shipping_weight,
            orderline_ids: od.order_line.clone(),
        })
        .collect();
    let line_ids = collect_line_ids(orders.iter().map(|od| &od.order_line));
    (rows, line_ids)
}

fn sale_line_row(line: SaleOrderLine) -> Option<SaleLineRow> {
    let (Some(order), Some(product)) = (&line.order_id, &line.product_template_id) else {
        warn!(line = line.id, "sale order line without order or product, skipped");
        return None;
    };
    Some(SaleLineRow {
        order_number: order.name().to_string(),
        product_name: product.name().to_string(),
        product_id: product.id(),
        internal_reference: reference_or_empty(product.name()),
        currency: name_of(&line.currency_id),
        order_partner: name_of(&line.order_partner_id),
        salesman: name_of(&line.salesman_id),
        state: line.state,
        uom: name_of(&line.product_uom),
        product_uom_qty: line.product_uom_qty,
        product_qty: line.product_qty,
        price_unit: line.price_unit,
        price_subtotal: line.price_subtotal,
        price_tax: line.price_tax,
        price_total: line.price_total,
        qty_to_invoice: line.qty_to_invoice,
        qty_to_deliver: line.qty_to_deliver,
        product_type: line.product_type.unwrap_or_default(),
        create_date: parse_datetime(line.create_date.as_deref()),
        is_delivery: line.is_delivery,
        discount: line.discount,
    })
}

/// Drops note lines and sorts the rest by creation time, oldest first.
pub fn sale_line_rows(lines: Vec<SaleOrderLine>) -> Vec<SaleLineRow> {
    let mut rows: Vec<SaleLineRow> = lines
        .into_iter()
        .filter(|l| l.display_type.as_deref() != Some(NOTE_LINE))
        .filter_map(sale_line_row)
        .collect();
    rows.sort_by_key(|r| r.create_date);
    rows
}

pub async fn sales_report<C: ObjectRpc>(rpc: &C, excluded_users: &[i64]) -> Result<SalesReport> {
    let client = SalesOrderClient::new(rpc);
    let ids = client.fetch_ids(excluded_users).await?;
    let orders = client.fetch_order_details(&ids).await?;
    let (orders, line_ids) = sale_order_rows(&orders);
    let lines = client.fetch_order_line_details(&line_ids).await?;
    let lines = sale_line_rows(lines);
    info!(orders = orders.len(), lines = lines.len(), "sales report ready");
    Ok(SalesReport {
        orders,
        line_ids,
        lines,
    })
}
