//! Records as read from the server. Fields that Odoo may report as `false` are `Option`.

use patterns::bracketed;
use serde::{Deserialize, Serialize};

use crate::odoo::{deserialize_odoo_nullable, Many2one};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub phone: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SaleOrder {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub company_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub partner_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub partner_invoice_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub partner_shipping_id: Option<Many2one>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub date_order: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub invoice_status: Option<String>,
    #[serde(default)]
    pub amount_total: f64,
    #[serde(default)]
    pub shipping_weight: f64,
    #[serde(default)]
    pub order_line: Vec<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SaleOrderLine {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub order_id: Option<Many2one>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub currency_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub order_partner_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub salesman_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_template_id: Option<Many2one>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_uom: Option<Many2one>,
    #[serde(default)]
    pub product_uom_qty: f64,
    #[serde(default)]
    pub product_qty: f64,
    #[serde(default)]
    pub price_unit: f64,
    #[serde(default)]
    pub price_subtotal: f64,
    #[serde(default)]
    pub price_tax: f64,
    #[serde(default)]
    pub price_total: f64,
    #[serde(default)]
    pub qty_to_invoice: f64,
    #[serde(default)]
    pub qty_to_deliver: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub create_date: Option<String>,
    #[serde(default)]
    pub is_delivery: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub display_type: Option<String>,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PurchaseOrder {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub company_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub partner_id: Option<Many2one>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub date_order: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub invoice_status: Option<String>,
    #[serde(default)]
    pub order_line: Vec<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PurchaseOrderLine {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub order_id: Option<Many2one>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub currency_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub partner_id: Option<Many2one>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_uom: Option<Many2one>,
    #[serde(default)]
    pub product_uom_qty: f64,
    #[serde(default)]
    pub product_qty: f64,
    #[serde(default)]
    pub price_unit: f64,
    #[serde(default)]
    pub price_subtotal: f64,
    #[serde(default)]
    pub price_tax: f64,
    #[serde(default)]
    pub price_total: f64,
    #[serde(default)]
    pub qty_to_invoice: f64,
    #[serde(default)]
    pub qty_received: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub date_order: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub display_type: Option<String>,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductTemplate {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub default_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub categ_id: Option<Many2one>,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default)]
    pub standard_price: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub uom_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub write_date: Option<String>,
    #[serde(default)]
    pub product_variant_count: i64,
    #[serde(default)]
    pub product_variant_ids: Vec<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub default_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub categ_id: Option<Many2one>,
    #[serde(default)]
    pub standard_price: f64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub write_date: Option<String>,
    #[serde(default)]
    pub qty_available: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub product_variant_count: i64,
    #[serde(default)]
    pub sales_count: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Pricelist {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub company_id: Option<Many2one>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PricelistItem {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub pricelist_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub company_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub currency_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_tmpl_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub name: Option<String>,
    #[serde(default)]
    pub fixed_price: f64,
    #[serde(default)]
    pub min_quantity: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub usage: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Quant {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub location_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub warehouse_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_uom_id: Option<Many2one>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub reserved_quantity: f64,
    #[serde(default)]
    pub available_quantity: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PutawayRule {
    pub id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub product_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub location_in_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub location_out_id: Option<Many2one>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub write_date: Option<String>,
}

/// Internal reference from a display name such as `"[DESK-01] Office desk"`.
/// Returns `None` when the name carries no bracketed reference.
pub fn internal_reference(name: &str) -> Option<&str> {
    bracketed().captures(name).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// First whitespace-separated word, used to shorten product names in tables.
pub fn short_product_name(name: &str) -> &str {
    name.split(' ').next().unwrap_or(name)
}

/// Last segment of a location path such as `"WH/Stock/Shelf 2"`.
pub fn short_location_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

mod patterns {
    use regex::Regex;
    use std::sync::OnceLock;

    pub fn bracketed() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("static regex"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_bracketed_reference() {
        assert_eq!(internal_reference("[DESK-01] Office desk"), Some("DESK-01"));
        assert_eq!(internal_reference("Chair [CH] [X]"), Some("CH"));
        assert_eq!(internal_reference("[] Empty"), Some(""));
        assert_eq!(internal_reference("No reference"), None);
    }

    #[test]
    fn shortens_names_for_display() {
        assert_eq!(short_product_name("[DESK-01] Office desk"), "[DESK-01]");
        assert_eq!(short_location_name("WH/Stock/Shelf 2"), "Shelf 2");
        assert_eq!(short_location_name("Stock"), "Stock");
    }

    #[test]
    fn quant_decodes_relational_fields() {
        let quant: Quant = serde_json::from_value(json!({
            "id": 5,
            "product_id": [11, "[A1] Widget"],
            "location_id": [8, "WH/Stock/A"],
            "warehouse_id": false,
            "product_uom_id": [1, "Units"],
            "quantity": 3.0,
            "reserved_quantity": 0.0,
            "available_quantity": 3.0
        }))
        .unwrap();
        assert_eq!(quant.product_id.unwrap().id(), 11);
        assert!(quant.warehouse_id.is_none());
    }

    #[test]
    fn note_lines_decode_without_product() {
        let line: SaleOrderLine = serde_json::from_value(json!({
            "id": 1,
            "order_id": [3, "S00003"],
            "name": "Deliver before noon",
            "product_template_id": false,
            "display_type": "line_note"
        }))
        .unwrap();
        assert_eq!(line.display_type.as_deref(), Some("line_note"));
        assert!(line.product_template_id.is_none());
    }
}
