//! Locations, quants and putaway rules.

use serde_json::json;
use tracing::info;

use crate::domain::{product_location_pairs, Domain};
use crate::error::Result;
use crate::models::{Location, PutawayRule, Quant};
use crate::odoo::{decode_records, KwArgs, ObjectRpc};

const MODEL_LOCATION: &str = "stock.location";
const FIELDS_LOCATION: &[&str] = &["id", "name", "active", "usage"];

pub(crate) const MODEL_QUANT: &str = "stock.quant";
const FIELDS_QUANT: &[&str] = &[
    "id",
    "product_id",
    "location_id",
    "quantity",
    "warehouse_id",
    "reserved_quantity",
    "available_quantity",
    "product_uom_id",
];

const MODEL_PUTAWAY: &str = "stock.putaway.rule";
const FIELDS_PUTAWAY: &[&str] = &[
    "id",
    "active",
    "product_id",
    "location_in_id",
    "location_out_id",
    "write_date",
];

/// Location path prefix of the main stock area.
pub const MAIN_STOCK_LOCATION: &str = "WH/Stock";

pub struct WarehouseClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> WarehouseClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        WarehouseClient { rpc }
    }

    pub async fn fetch_putaway_rule_ids(&self) -> Result<Vec<i64>> {
        info!("fetching putaway rule ids");
        self.rpc.search(MODEL_PUTAWAY, &Domain::new()).await
    }

    pub async fn fetch_putaway_rule_details(&self, ids: &[i64]) -> Result<Vec<PutawayRule>> {
        info!(count = ids.len(), "fetching putaway rule details");
        let value = self.rpc.read(MODEL_PUTAWAY, ids, FIELDS_PUTAWAY).await?;
        decode_records(MODEL_PUTAWAY, value)
    }

    pub async fn fetch_location_ids(&self) -> Result<Vec<i64>> {
        self.rpc.search(MODEL_LOCATION, &Domain::new()).await
    }

    pub async fn fetch_location_ids_by_complete_name(&self, complete_name: &str) -> Result<Vec<i64>> {
        let domain = Domain::new().term("complete_name", "ilike", complete_name);
        self.rpc.search(MODEL_LOCATION, &domain).await
    }

    pub async fn fetch_location_details(&self, ids: &[i64]) -> Result<Vec<Location>> {
        let value = self.rpc.read(MODEL_LOCATION, ids, FIELDS_LOCATION).await?;
        decode_records(MODEL_LOCATION, value)
    }

    /// Quants stored anywhere below the main stock location.
    pub async fn fetch_quant_ids(&self) -> Result<Vec<i64>> {
        info!("fetching quant ids");
        let domain = Domain::new().term("location_id", "ilike", MAIN_STOCK_LOCATION);
        self.rpc.search(MODEL_QUANT, &domain).await
    }

    pub async fn fetch_quant_details(&self, ids: &[i64]) -> Result<Vec<Quant>> {
        info!(count = ids.len(), "fetching quant details");
        let value = self.rpc.read(MODEL_QUANT, ids, FIELDS_QUANT).await?;
        decode_records(MODEL_QUANT, value)
    }

    pub async fn fetch_quants_by_product_location(
        &self,
        product_id: i64,
        location_id: i64,
    ) -> Result<Vec<Quant>> {
        let domain = Domain::new()
            .term("product_id", "=", product_id)
            .term("location_id", "=", location_id);
        let value = self
            .rpc
            .search_read(MODEL_QUANT, &domain, KwArgs::fields(FIELDS_QUANT))
            .await?;
        decode_records(MODEL_QUANT, value)
    }

    /// Quants matching any `(product_ids[i], location_ids[i])` pair.
    pub async fn fetch_quants_by_products_locations(
        &self,
        product_ids: &[i64],
        location_ids: &[i64],
    ) -> Result<Vec<Quant>> {
        info!(pairs = product_ids.len(), "fetching quants by product and location");
        let domain = product_location_pairs(product_ids, location_ids)?;
        let value = self
            .rpc
            .search_read(MODEL_QUANT, &domain, KwArgs::fields(FIELDS_QUANT))
            .await?;
        decode_records(MODEL_QUANT, value)
    }

    pub async fn relocate_quant(&self, quant_id: i64, location_id: i64) -> Result<bool> {
        info!(quant_id, location_id, "relocating quant");
        self.rpc
            .write(MODEL_QUANT, &[quant_id], json!({ "location_id": location_id }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::odoo::mock::MockRpc;

    #[tokio::test]
    async fn quant_ids_are_limited_to_main_stock() {
        let rpc = MockRpc::new().reply(MODEL_QUANT, "search", json!([1]));
        WarehouseClient::new(&rpc).fetch_quant_ids().await.unwrap();
        assert_eq!(
            rpc.calls()[0].args,
            json!([[["location_id", "ilike", "WH/Stock"]]])
        );
    }

    #[tokio::test]
    async fn mismatched_pairs_fail_before_any_call() {
        let rpc = MockRpc::new();
        let err = WarehouseClient::new(&rpc)
            .fetch_quants_by_products_locations(&[1, 2], &[3])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn relocation_writes_location() {
        let rpc = MockRpc::new().reply(MODEL_QUANT, "write", json!(true));
        assert!(WarehouseClient::new(&rpc).relocate_quant(12, 40).await.unwrap());
        assert_eq!(rpc.calls()[0].args, json!([[12], {"location_id": 40}]));
    }

    #[tokio::test]
    async fn putaway_rules_decode() {
        let rpc = MockRpc::new().reply(
            MODEL_PUTAWAY,
            "read",
            json!([{
                "id": 1,
                "active": true,
                "product_id": [5, "[A1] Widget"],
                "location_in_id": [8, "WH/Stock"],
                "location_out_id": [9, "WH/Stock/Shelf 1"],
                "write_date": "2024-01-01 00:00:00"
            }]),
        );
        let rules = WarehouseClient::new(&rpc)
            .fetch_putaway_rule_details(&[1])
            .await
            .unwrap();
        assert_eq!(rules[0].location_out_id.as_ref().unwrap().id(), 9);
    }
}
