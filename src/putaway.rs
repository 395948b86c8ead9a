//! Moves stock that sits on a putaway rule's incoming location to the rule's
//! storage location.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::clients::WarehouseClient;
use crate::error::Result;
use crate::export::{float, TableRow};
use crate::models::{short_location_name, short_product_name, PutawayRule};
use crate::odoo::ObjectRpc;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StockToMove {
    pub product_id: i64,
    pub product_name: String,
    pub location_in_id: i64,
    pub location_in_name: String,
    pub location_out_id: i64,
    pub location_out_name: String,
    pub quant_id: i64,
    pub quant_quantity: f64,
}

impl fmt::Display for StockToMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x {} from {} to {}",
            self.quant_quantity,
            short_product_name(&self.product_name),
            short_location_name(&self.location_in_name),
            short_location_name(&self.location_out_name)
        )
    }
}

impl TableRow for StockToMove {
    fn headers() -> Vec<&'static str> {
        vec!["Product", "From", "To", "Quantity"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            short_product_name(&self.product_name).to_string(),
            self.location_in_name.clone(),
            short_location_name(&self.location_out_name).to_string(),
            float(self.quant_quantity),
        ]
    }
}

/// A rule with every relational field present.
struct CompleteRule<'a> {
    product: &'a crate::odoo::Many2one,
    location_in: &'a crate::odoo::Many2one,
    location_out: &'a crate::odoo::Many2one,
}

fn complete(rule: &PutawayRule) -> Option<CompleteRule<'_>> {
    match (&rule.product_id, &rule.location_in_id, &rule.location_out_id) {
        (Some(product), Some(location_in), Some(location_out)) => Some(CompleteRule {
            product,
            location_in,
            location_out,
        }),
        _ => {
            warn!(rule = rule.id, "putaway rule without product or locations, ignored");
            None
        }
    }
}

/// Quants still sitting on a rule's incoming location, with a non-zero whole quantity.
pub async fn find_stock_to_move<C: ObjectRpc>(rpc: &C) -> Result<Vec<StockToMove>> {
    let client = WarehouseClient::new(rpc);
    let rule_ids = client.fetch_putaway_rule_ids().await?;
    info!(count = rule_ids.len(), "putaway rules found");
    let rules = client.fetch_putaway_rule_details(&rule_ids).await?;

    let complete_rules: Vec<CompleteRule<'_>> = rules.iter().filter_map(complete).collect();
    if complete_rules.is_empty() {
        info!("no usable putaway rules");
        return Ok(Vec::new());
    }

    let by_key: HashMap<(i64, i64), &CompleteRule<'_>> = complete_rules
        .iter()
        .map(|r| ((r.product.id(), r.location_in.id()), r))
        .collect();
    let product_ids: Vec<i64> = complete_rules.iter().map(|r| r.product.id()).collect();
    let location_ids: Vec<i64> = complete_rules.iter().map(|r| r.location_in.id()).collect();

    let quants = client
        .fetch_quants_by_products_locations(&product_ids, &location_ids)
        .await?;

    let matched: Vec<StockToMove> = quants
        .iter()
        .filter_map(|quant| {
            let key = (
                quant.product_id.as_ref()?.id(),
                quant.location_id.as_ref()?.id(),
            );
            let rule = by_key.get(&key)?;
            Some(StockToMove {
                product_id: rule.product.id(),
                product_name: rule.product.name().to_string(),
                location_in_id: rule.location_in.id(),
                location_in_name: rule.location_in.name().to_string(),
                location_out_id: rule.location_out.id(),
                location_out_name: rule.location_out.name().to_string(),
                quant_id: quant.id,
                quant_quantity: quant.quantity,
            })
        })
        .collect();
    info!(count = matched.len(), "quants matched to putaway rules");

    let moves: Vec<StockToMove> = matched
        .into_iter()
        .filter(|m| m.quant_quantity.trunc() != 0.0)
        .collect();
    info!(count = moves.len(), "stock to move after dropping empty quants");
    Ok(moves)
}

/// Writes each move to the server, pausing `delay` after every write.
/// Returns the number of quants relocated.
pub async fn relocate<C: ObjectRpc>(
    rpc: &C,
    moves: &[StockToMove],
    delay: Duration,
    dry_run: bool,
) -> Result<usize> {
    let client = WarehouseClient::new(rpc);
    let mut done = 0;
    for m in moves {
        if dry_run {
            info!(quant = m.quant_id, "dry run: would relocate {}", m);
            continue;
        }
        if client.relocate_quant(m.quant_id, m.location_out_id).await? {
            info!("relocated {}", m);
            done += 1;
        } else {
            warn!(quant = m.quant_id, "server did not confirm the relocation of {}", m);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(done)
}
