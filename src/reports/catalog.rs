use serde::Serialize;
use tracing::info;

use super::name_of;
use crate::clients::{ProductClient, ProductTemplateClient};
use crate::error::Result;
use crate::export::{float, TableRow};
use crate::models::{short_product_name, Product, ProductTemplate};
use crate::odoo::ObjectRpc;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub list_price: f64,
    pub default_code: String,
    pub barcode: String,
    pub standard_price: f64,
    pub write_date: String,
    pub active: bool,
    pub qty_available: f64,
}

impl TableRow for ProductRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Reference", "Barcode", "Sales price", "Cost", "On hand"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            short_product_name(&self.name).to_string(),
            self.default_code.clone(),
            self.barcode.clone(),
            float(self.list_price),
            float(self.standard_price),
            float(self.qty_available),
        ]
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplateRow {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub categ_id: String,
    pub list_price: f64,
    pub default_code: String,
    pub barcode: String,
    pub standard_price: f64,
    pub volume: f64,
    pub weight: f64,
    pub uom_name: String,
}

impl TableRow for TemplateRow {
    fn headers() -> Vec<&'static str> {
        vec!["Id", "Reference", "Name", "Category", "Sales price", "Cost"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.default_code.clone(),
            self.name.clone(),
            self.categ_id.clone(),
            float(self.list_price),
            float(self.standard_price),
        ]
    }
}

/// Active products only; missing codes and barcodes become empty strings.
pub fn product_rows(products: Vec<Product>) -> Vec<ProductRow> {
    products
        .into_iter()
        .filter(|p| p.active)
        .map(|p| ProductRow {
            id: p.id,
            name: p.name,
            list_price: p.list_price,
            default_code: p.default_code.unwrap_or_default(),
            barcode: p.barcode.unwrap_or_default(),
            standard_price: p.standard_price,
            write_date: p.write_date.unwrap_or_default(),
            active: p.active,
            qty_available: p.qty_available,
        })
        .collect()
}

pub fn template_rows(templates: Vec<ProductTemplate>) -> Vec<TemplateRow> {
    templates
        .into_iter()
        .map(|t| TemplateRow {
            categ_id: name_of(&t.categ_id),
            id: t.id,
            display_name: t.display_name.unwrap_or_else(|| t.name.clone()),
            name: t.name,
            list_price: t.list_price,
            default_code: t.default_code.unwrap_or_default(),
            barcode: t.barcode.unwrap_or_default(),
            standard_price: t.standard_price,
            volume: t.volume,
            weight: t.weight,
            uom_name: t.uom_name.unwrap_or_default(),
        })
        .collect()
}

pub async fn products_report<C: ObjectRpc>(rpc: &C) -> Result<Vec<ProductRow>> {
    let client = ProductClient::new(rpc);
    let ids = client.fetch_product_ids().await?;
    let products = client.fetch_product_details(&ids).await?;
    info!(count = products.len(), "products fetched");
    let rows = product_rows(products);
    info!(count = rows.len(), "active products");
    Ok(rows)
}

pub async fn templates_report<C: ObjectRpc>(rpc: &C, ids: &[i64]) -> Result<Vec<TemplateRow>> {
    let templates = ProductTemplateClient::new(rpc)
        .fetch_template_report(ids)
        .await?;
    Ok(template_rows(templates))
}
