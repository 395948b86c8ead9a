//! Reconciles a VIP price export against Odoo pricelist items.
//!
//! VIP rows are keyed by `"<group name>_<internal reference>"`, Odoo items by
//! `"<pricelist name>_<template default code>"`. A VIP row whose group exists in Odoo
//! either updates every item sharing its key or, when none does, creates one.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::clients::{ProductClient, ProductTemplateClient};
use crate::error::{Error, Result};
use crate::export::{float, TableRow};
use crate::models::{internal_reference, Pricelist, PricelistItem, ProductTemplate};
use crate::odoo::ObjectRpc;

const MODEL_ITEM: &str = "product.pricelist.item";
const CURRENCY_SUFFIX: &str = "(EUR)";

fn pack_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)PK(\d+)$").expect("static regex"))
}

/// One row of the VIP export, prices per sales unit (a pack).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VipPrice {
    pub group_name: String,
    pub article_number: String,
    pub custom_price: f64,
    #[serde(default)]
    pub std_price_a: f64,
    #[serde(default)]
    pub std_price_b: f64,
}

#[derive(Deserialize, Debug)]
struct VipFile {
    data: Vec<VipPrice>,
}

pub fn load_vip_prices(path: &Path) -> Result<Vec<VipPrice>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let file: VipFile = serde_json::from_str(&raw)?;
    info!(rows = file.data.len(), path = %path.display(), "loaded vip prices");
    Ok(file.data)
}

/// A VIP row normalized to unit prices.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VipLine {
    pub group_name: String,
    pub internal_reference: String,
    pub min_quantity: u32,
    pub custom_price: f64,
    pub std_price_a: f64,
    pub std_price_b: f64,
    pub key: String,
}

/// Splits `"<reference>PK<n>"` into reference and pack size; other article numbers
/// are single units.
pub fn split_article_number(article_number: &str) -> (String, u32) {
    match pack_pattern().captures(article_number) {
        Some(caps) => {
            let reference = caps.get(1).map_or("", |m| m.as_str()).to_string();
            match caps[2].parse::<u32>() {
                Ok(size) => (reference, size),
                Err(_) => (article_number.to_string(), 1),
            }
        }
        None => (article_number.to_string(), 1),
    }
}

pub fn vip_key(group_name: &str, reference: &str) -> String {
    format!("{}_{}", group_name.trim(), reference)
}

/// Normalizes prices to unit prices and sorts by group, keeping input order within a
/// group. Rows with a zero pack size are dropped.
pub fn prepare_vip_lines(rows: Vec<VipPrice>) -> Vec<VipLine> {
    let mut lines: Vec<VipLine> = rows
        .into_iter()
        .filter_map(|row| {
            let (reference, units) = split_article_number(&row.article_number);
            if units == 0 {
                warn!(article = %row.article_number, "pack size of zero, row skipped");
                return None;
            }
            let divisor = f64::from(units);
            Some(VipLine {
                key: vip_key(&row.group_name, &reference),
                group_name: row.group_name.trim().to_string(),
                internal_reference: reference,
                min_quantity: units,
                custom_price: row.custom_price / divisor,
                std_price_a: row.std_price_a / divisor,
                std_price_b: row.std_price_b / divisor,
            })
        })
        .collect();
    lines.sort_by(|a, b| a.group_name.cmp(&b.group_name));
    lines
}

/// Distinct group names in first-seen order.
pub fn group_names(lines: &[VipLine]) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|l| seen.insert(l.group_name.as_str()))
        .map(|l| l.group_name.clone())
        .collect()
}

/// An Odoo pricelist item flattened for matching.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OdooItem {
    pub id: i64,
    pub pricelist_id: i64,
    pub pricelist_name: String,
    pub company_name: String,
    pub fixed_price: f64,
    pub min_quantity: f64,
    pub currency: String,
    pub product_tmpl_id: Option<i64>,
    pub product_tmpl_name: String,
    pub default_code: String,
    pub key: String,
}

pub fn odoo_items(items: Vec<PricelistItem>) -> Vec<OdooItem> {
    items
        .into_iter()
        .filter_map(|item| {
            let Some(pricelist) = &item.pricelist_id else {
                warn!(item = item.id, "pricelist item without pricelist, ignored");
                return None;
            };
            let pricelist_name = pricelist.name().replace(CURRENCY_SUFFIX, "").trim().to_string();
            let label = item
                .product_tmpl_id
                .as_ref()
                .map(|t| t.name().to_string())
                .unwrap_or_default();
            let default_code = internal_reference(&label).unwrap_or("").to_string();
            Some(OdooItem {
                id: item.id,
                pricelist_id: pricelist.id(),
                key: vip_key(&pricelist_name, &default_code),
                pricelist_name,
                company_name: item
                    .company_id
                    .as_ref()
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
                fixed_price: item.fixed_price,
                min_quantity: item.min_quantity,
                currency: item
                    .currency_id
                    .as_ref()
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
                product_tmpl_id: item.product_tmpl_id.as_ref().map(|t| t.id()),
                product_tmpl_name: label,
                default_code,
            })
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "action", content = "item_id", rename_all = "lowercase")]
pub enum Action {
    Create,
    Update(i64),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub vip: VipLine,
    pub odoo: Option<OdooItem>,
    #[serde(flatten)]
    pub action: Action,
}

impl TableRow for ComparisonRow {
    fn headers() -> Vec<&'static str> {
        vec![
            "Group",
            "Reference",
            "Min qty",
            "VIP unit price",
            "Odoo price",
            "Action",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.vip.group_name.clone(),
            self.vip.internal_reference.clone(),
            self.vip.min_quantity.to_string(),
            float(self.vip.custom_price),
            self.odoo
                .as_ref()
                .map(|o| float(o.fixed_price))
                .unwrap_or_default(),
            match self.action {
                Action::Create => "create".to_string(),
                Action::Update(id) => format!("update #{}", id),
            },
        ]
    }
}

/// Left-joins VIP lines onto Odoo items by key, restricted to groups that exist in
/// Odoo. A line matching several items yields one update per item.
pub fn compare(
    lines: &[VipLine],
    items: &[OdooItem],
    pricelist_names_in_odoo: &[String],
) -> Vec<ComparisonRow> {
    let known: HashSet<&str> = pricelist_names_in_odoo.iter().map(|n| n.trim()).collect();
    let mut by_key: HashMap<&str, Vec<&OdooItem>> = HashMap::new();
    for item in items {
        by_key.entry(item.key.as_str()).or_default().push(item);
    }

    let mut rows = Vec::new();
    for line in lines.iter().filter(|l| known.contains(l.group_name.as_str())) {
        match by_key.get(line.key.as_str()) {
            Some(matches) => {
                for item in matches {
                    rows.push(ComparisonRow {
                        vip: line.clone(),
                        odoo: Some((*item).clone()),
                        action: Action::Update(item.id),
                    });
                }
            }
            None => rows.push(ComparisonRow {
                vip: line.clone(),
                odoo: None,
                action: Action::Create,
            }),
        }
    }
    rows
}

/// Everything read from Odoo plus the comparison, ready for review before writing.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub pricelists: Vec<Pricelist>,
    pub missing_pricelists: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl SyncPlan {
    pub fn updates(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r.action, Action::Update(_)))
    }

    pub fn creates(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| r.action == Action::Create)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    pub updated: usize,
    pub created: usize,
    /// Internal references with no active product template.
    pub not_found: Vec<String>,
}

pub struct PricelistSync<'a, C: ObjectRpc> {
    rpc: &'a C,
    delay: Duration,
    dry_run: bool,
}

impl<'a, C: ObjectRpc> PricelistSync<'a, C> {
    pub fn new(rpc: &'a C, delay: Duration, dry_run: bool) -> Self {
        PricelistSync {
            rpc,
            delay,
            dry_run,
        }
    }

    /// Pricelists in Odoo named after the VIP groups.
    pub async fn fetch_pricelists(&self, groups: &[String]) -> Result<Vec<Pricelist>> {
        ProductClient::new(self.rpc)
            .fetch_pricelists_by_names(groups)
            .await
    }

    pub async fn plan(&self, lines: &[VipLine]) -> Result<SyncPlan> {
        let groups = group_names(lines);
        info!(groups = groups.len(), "vip groups");
        let pricelists = self.fetch_pricelists(&groups).await?;
        let names_in_odoo: Vec<String> =
            pricelists.iter().map(|p| p.name.trim().to_string()).collect();
        let missing_pricelists: Vec<String> = groups
            .iter()
            .filter(|g| !names_in_odoo.contains(g))
            .cloned()
            .collect();
        info!(
            found = names_in_odoo.len(),
            missing = missing_pricelists.len(),
            "vip groups matched to odoo pricelists"
        );

        let ids: Vec<i64> = pricelists.iter().map(|p| p.id).collect();
        let items = ProductClient::new(self.rpc)
            .fetch_pricelist_items_in(&ids)
            .await?;
        let rows = compare(lines, &odoo_items(items), &names_in_odoo);

        Ok(SyncPlan {
            pricelists,
            missing_pricelists,
            rows,
        })
    }

    pub async fn apply(&self, plan: &SyncPlan) -> Result<SyncOutcome> {
        let templates = ProductTemplateClient::new(self.rpc)
            .fetch_active_by_default_code()
            .await?;
        let updated = self.update_items(plan).await?;
        let (created, not_found) = self.create_items(plan, &templates).await?;
        let outcome = SyncOutcome {
            updated,
            created,
            not_found,
        };
        info!(
            updated = outcome.updated,
            created = outcome.created,
            not_found = outcome.not_found.len(),
            "pricelist sync finished"
        );
        Ok(outcome)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn update_items(&self, plan: &SyncPlan) -> Result<usize> {
        let mut count = 0;
        for (i, row) in plan.updates().enumerate() {
            let Action::Update(item_id) = row.action else {
                continue;
            };
            let values = json!({
                "fixed_price": row.vip.custom_price,
                "min_quantity": row.vip.min_quantity,
                "compute_price": "fixed",
            });
            info!(n = i + 1, item_id, group = %row.vip.group_name, %values, "updating pricelist item");
            if self.dry_run {
                continue;
            }
            if self.rpc.write(MODEL_ITEM, &[item_id], values).await? {
                count += 1;
            } else {
                warn!(item_id, "server did not confirm the pricelist item write");
            }
            self.pause().await;
        }
        Ok(count)
    }

    async fn create_items(
        &self,
        plan: &SyncPlan,
        templates: &HashMap<String, ProductTemplate>,
    ) -> Result<(usize, Vec<String>)> {
        let by_name: HashMap<&str, &Pricelist> = plan
            .pricelists
            .iter()
            .map(|p| (p.name.trim(), p))
            .collect();
        let mut not_found = Vec::new();
        let mut count = 0;

        for (i, row) in plan.creates().enumerate() {
            let reference = &row.vip.internal_reference;
            let Some(template) = templates.get(reference) else {
                warn!(reference = %reference, "product template not found");
                not_found.push(reference.clone());
                continue;
            };
            let Some(pricelist) = by_name.get(row.vip.group_name.as_str()) else {
                warn!(group = %row.vip.group_name, "pricelist not found in odoo");
                continue;
            };
            let values = json!({
                "pricelist_id": pricelist.id,
                "product_tmpl_id": template.id,
                "fixed_price": row.vip.custom_price,
                "min_quantity": row.vip.min_quantity,
                "compute_price": "fixed",
            });
            info!(n = i + 1, group = %row.vip.group_name, reference = %reference, %values, "creating pricelist item");
            if self.dry_run {
                continue;
            }
            self.rpc.create(MODEL_ITEM, values).await?;
            count += 1;
            self.pause().await;
        }
        Ok((count, not_found))
    }
}
