//! `product.product`, `product.template` and the pricelist models.

use std::collections::HashMap;

use serde_json::Value;
use tracing::info;

use crate::domain::Domain;
use crate::error::Result;
use crate::models::{Pricelist, PricelistItem, Product, ProductTemplate};
use crate::odoo::{decode_records, KwArgs, ObjectRpc};

const MODEL_PRODUCT: &str = "product.product";
const FIELDS_PRODUCT: &[&str] = &[
    "id",
    "name",
    "list_price",
    "default_code",
    "description",
    "categ_id",
    "barcode",
    "standard_price",
    "taxes_id",
    "write_date",
    "qty_available",
    "active",
    "product_variant_count",
    "sales_count",
];

const MODEL_TEMPLATE: &str = "product.template";
const FIELDS_TEMPLATE: &[&str] = &[
    "id",
    "name",
    "default_code",
    "write_date",
    "active",
    "product_variant_count",
    "product_variant_ids",
];
const FIELDS_TEMPLATE_REPORT: &[&str] = &[
    "id",
    "name",
    "display_name",
    "list_price",
    "default_code",
    "uom_name",
    "active",
    "barcode",
    "standard_price",
    "volume",
    "weight",
    "categ_id",
];

pub(crate) const MODEL_PRICELIST: &str = "product.pricelist";
const FIELDS_PRICELIST: &[&str] = &["id", "name", "active", "company_id"];

pub(crate) const MODEL_PRICELIST_ITEM: &str = "product.pricelist.item";
const FIELDS_PRICELIST_ITEM: &[&str] = &[
    "id",
    "company_id",
    "pricelist_id",
    "fixed_price",
    "name",
    "currency_id",
    "min_quantity",
    "product_tmpl_id",
    "product_id",
];

fn active_single_variant() -> Domain {
    Domain::new()
        .term("active", "=", true)
        .term("product_variant_count", "=", 1)
}

pub struct ProductClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> ProductClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        ProductClient { rpc }
    }

    pub async fn fetch_product_ids(&self) -> Result<Vec<i64>> {
        self.rpc
            .search(MODEL_PRODUCT, &active_single_variant())
            .await
    }

    pub async fn fetch_product_details(&self, ids: &[i64]) -> Result<Vec<Product>> {
        info!(count = ids.len(), "fetching product details");
        let value = self.rpc.read(MODEL_PRODUCT, ids, FIELDS_PRODUCT).await?;
        decode_records(MODEL_PRODUCT, value)
    }

    pub async fn fetch_pricelists(&self) -> Result<Vec<Pricelist>> {
        let domain = Domain::new().term("active", "=", true);
        let value = self
            .rpc
            .search_read(MODEL_PRICELIST, &domain, KwArgs::fields(FIELDS_PRICELIST))
            .await?;
        decode_records(MODEL_PRICELIST, value)
    }

    /// Pricelists whose name is one of `names`; surrounding whitespace is ignored.
    pub async fn fetch_pricelists_by_names(&self, names: &[String]) -> Result<Vec<Pricelist>> {
        let names: Vec<Value> = names
            .iter()
            .map(|n| Value::String(n.trim().to_string()))
            .collect();
        let domain = Domain::new().term("name", "in", names);
        let ids = self.rpc.search(MODEL_PRICELIST, &domain).await?;
        let value = self.rpc.read(MODEL_PRICELIST, &ids, FIELDS_PRICELIST).await?;
        let pricelists: Vec<Pricelist> = decode_records(MODEL_PRICELIST, value)?;
        info!(count = pricelists.len(), "matching pricelists found");
        Ok(pricelists)
    }

    pub async fn fetch_pricelist_item_ids(&self, pricelist_id: i64) -> Result<Vec<i64>> {
        let domain = Domain::new().term("pricelist_id", "=", pricelist_id);
        self.rpc.search(MODEL_PRICELIST_ITEM, &domain).await
    }

    pub async fn fetch_pricelist_item_details(&self, ids: &[i64]) -> Result<Vec<PricelistItem>> {
        let value = self
            .rpc
            .read(MODEL_PRICELIST_ITEM, ids, FIELDS_PRICELIST_ITEM)
            .await?;
        decode_records(MODEL_PRICELIST_ITEM, value)
    }

    pub async fn fetch_pricelist_items_in(&self, pricelist_ids: &[i64]) -> Result<Vec<PricelistItem>> {
        if pricelist_ids.is_empty() {
            return Ok(Vec::new());
        }
        let domain = Domain::new().term("pricelist_id", "in", pricelist_ids.to_vec());
        let value = self
            .rpc
            .search_read(
                MODEL_PRICELIST_ITEM,
                &domain,
                KwArgs::fields(FIELDS_PRICELIST_ITEM),
            )
            .await?;
        let items: Vec<PricelistItem> = decode_records(MODEL_PRICELIST_ITEM, value)?;
        info!(count = items.len(), "pricelist items found");
        Ok(items)
    }
}

pub struct ProductTemplateClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> ProductTemplateClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        ProductTemplateClient { rpc }
    }

    pub async fn fetch_template_ids(&self) -> Result<Vec<i64>> {
        self.rpc
            .search(MODEL_TEMPLATE, &active_single_variant())
            .await
    }

    pub async fn fetch_template_details(&self, ids: &[i64]) -> Result<Vec<ProductTemplate>> {
        let value = self.rpc.read(MODEL_TEMPLATE, ids, FIELDS_TEMPLATE).await?;
        decode_records(MODEL_TEMPLATE, value)
    }

    /// Reads the given templates whether archived or not.
    pub async fn fetch_template_report(&self, ids: &[i64]) -> Result<Vec<ProductTemplate>> {
        let domain = Domain::all_of(vec![
            Domain::new().term("id", "in", ids.to_vec()),
            Domain::any_of(vec![
                Domain::new().term("active", "=", true),
                Domain::new().term("active", "=", false),
            ]),
        ]);
        let value = self
            .rpc
            .search_read(MODEL_TEMPLATE, &domain, KwArgs::fields(FIELDS_TEMPLATE_REPORT))
            .await?;
        decode_records(MODEL_TEMPLATE, value)
    }

    /// Active templates keyed by internal reference. Templates without one are skipped.
    pub async fn fetch_active_by_default_code(&self) -> Result<HashMap<String, ProductTemplate>> {
        let domain = Domain::new().term("active", "=", true);
        let value = self
            .rpc
            .search_read(
                MODEL_TEMPLATE,
                &domain,
                KwArgs::fields(&["id", "name", "default_code"]),
            )
            .await?;
        let templates: Vec<ProductTemplate> = decode_records(MODEL_TEMPLATE, value)?;
        info!(count = templates.len(), "active product templates");
        Ok(templates
            .into_iter()
            .filter_map(|t| match t.default_code.clone() {
                Some(code) if !code.is_empty() => Some((code, t)),
                _ => None,
            })
            .collect())
    }
}
