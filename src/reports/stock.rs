use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use super::name_of;
use crate::clients::WarehouseClient;
use crate::error::Result;
use crate::export::{float, TableRow};
use crate::models::{short_location_name, short_product_name, Quant};
use crate::odoo::ObjectRpc;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QuantRow {
    pub product_id: i64,
    pub product_name: String,
    pub location_id: i64,
    pub location_name: String,
    pub product_uom: String,
    pub warehouse_name: String,
    pub quantity: f64,
    pub available_quantity: f64,
}

impl fmt::Display for QuantRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x {} in {} ({})",
            self.quantity,
            short_product_name(&self.product_name),
            self.location_name,
            self.warehouse_name
        )
    }
}

impl TableRow for QuantRow {
    fn headers() -> Vec<&'static str> {
        vec!["Product", "Location", "Warehouse", "Quantity", "Available"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            short_product_name(&self.product_name).to_string(),
            short_location_name(&self.location_name).to_string(),
            self.warehouse_name.clone(),
            float(self.quantity),
            float(self.available_quantity),
        ]
    }
}

/// Quants as rows sorted by product name. Quants without product or location are skipped.
pub fn quant_rows(quants: Vec<Quant>) -> Vec<QuantRow> {
    let mut rows: Vec<QuantRow> = quants
        .into_iter()
        .filter_map(|q| {
            let (Some(product), Some(location)) = (&q.product_id, &q.location_id) else {
                warn!(quant = q.id, "quant without product or location, skipped");
                return None;
            };
            Some(QuantRow {
                product_id: product.id(),
                product_name: product.name().to_string(),
                location_id: location.id(),
                location_name: location.name().to_string(),
                product_uom: name_of(&q.product_uom_id),
                warehouse_name: name_of(&q.warehouse_id),
                quantity: q.quantity,
                available_quantity: q.available_quantity,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
    rows
}

pub async fn quants_report<C: ObjectRpc>(rpc: &C) -> Result<Vec<QuantRow>> {
    let client = WarehouseClient::new(rpc);
    let ids = client.fetch_quant_ids().await?;
    let rows = quant_rows(client.fetch_quant_details(&ids).await?);
    info!(count = rows.len(), "quants to show");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odoo::mock::MockRpc;
    use serde_json::json;

    #[tokio::test]
    async fn quants_sorted_by_product_name() {
        let rpc = MockRpc::new()
            .reply("stock.quant", "search", json!([1, 2, 3]))
            .reply(
                "stock.quant",
                "read",
                json!([
                    {"id": 1, "product_id": [2, "[B2] Bracket"], "location_id": [8, "WH/Stock/A"],
                     "warehouse_id": [1, "WH"], "product_uom_id": [1, "Units"], "quantity": 4.0, "available_quantity": 4.0},
                    {"id": 2, "product_id": [1, "[A1] Anchor"], "location_id": [9, "WH/Stock/B"],
                     "warehouse_id": [1, "WH"], "product_uom_id": [1, "Units"], "quantity": 1.0, "available_quantity": 0.0},
                    {"id": 3, "product_id": false, "location_id": [9, "WH/Stock/B"], "quantity": 1.0}
                ]),
            );
        let rows = quants_report(&rpc).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "[A1] Anchor");
        assert_eq!(rows[0].cells()[1], "B");
        assert_eq!(rows[1].to_string(), "4x [B2] in WH/Stock/A (WH)");
    }
}
