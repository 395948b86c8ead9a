use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use odoo_ops::odoo::ObjectRpc;
use odoo_ops::pricelist::{prepare_vip_lines, Action, PricelistSync, VipPrice};
use odoo_ops::{putaway, Result};

/// In-memory server holding one pricelist, one item and a few templates.
struct FakeServer {
    writes: Mutex<Vec<(String, String, Value)>>,
}

impl FakeServer {
    fn new() -> Self {
        FakeServer {
            writes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ObjectRpc for FakeServer {
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        _kwargs: Value,
    ) -> Result<Value> {
        let reply = match (model, method) {
            ("product.pricelist", "search") => json!([3]),
            ("product.pricelist", "read") => {
                json!([{"id": 3, "name": "Wholesale", "active": true, "company_id": [1, "Acme"]}])
            }
            ("product.pricelist.item", "search_read") => json!([{
                "id": 31,
                "pricelist_id": [3, "Wholesale (EUR)"],
                "company_id": [1, "Acme"],
                "currency_id": [1, "EUR"],
                "product_tmpl_id": [70, "[SCREW-4] Wood screw"],
                "product_id": false,
                "name": "[SCREW-4] Wood screw",
                "fixed_price": 0.05,
                "min_quantity": 100.0
            }]),
            ("product.template", "search_read") => json!([
                {"id": 70, "name": "Wood screw", "default_code": "SCREW-4"},
                {"id": 71, "name": "Wall plug", "default_code": "PLUG-6"}
            ]),
            ("product.pricelist.item", "write") | ("stock.quant", "write") => {
                self.writes
                    .lock()
                    .unwrap()
                    .push((model.to_string(), method.to_string(), args));
                json!(true)
            }
            ("product.pricelist.item", "create") => {
                self.writes
                    .lock()
                    .unwrap()
                    .push((model.to_string(), method.to_string(), args));
                json!(500)
            }
            ("stock.putaway.rule", "search") => json!([]),
            _ => json!([]),
        };
        Ok(reply)
    }
}

fn vip(group: &str, article: &str, price: f64) -> VipPrice {
    VipPrice {
        group_name: group.to_string(),
        article_number: article.to_string(),
        custom_price: price,
        std_price_a: price,
        std_price_b: price,
    }
}

#[tokio::test]
async fn vip_export_updates_existing_and_creates_new_items() {
    let server = FakeServer::new();
    let lines = prepare_vip_lines(vec![
        vip("Wholesale", "SCREW-4PK100", 4.0),
        vip("Wholesale", "PLUG-6PK50", 5.0),
        vip("Wholesale", "HOOK-1", 0.8),
        vip("Retail", "SCREW-4", 0.1),
    ]);

    let sync = PricelistSync::new(&server, Duration::ZERO, false);
    let plan = sync.plan(&lines).await.unwrap();
    assert_eq!(plan.missing_pricelists, vec!["Retail".to_string()]);

    let actions: Vec<Action> = plan.rows.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![Action::Update(31), Action::Create, Action::Create]);

    let outcome = sync.apply(&plan).await.unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.not_found, vec!["HOOK-1".to_string()]);

    let writes = server.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(
        writes[0].2,
        json!([[31], {"fixed_price": 0.04, "min_quantity": 100, "compute_price": "fixed"}])
    );
    assert_eq!(writes[1].1, "create");
    assert_eq!(writes[1].2[0]["product_tmpl_id"], 71);
    assert_eq!(writes[1].2[0]["fixed_price"], 0.1);
    assert_eq!(writes[1].2[0]["min_quantity"], 50);
}

#[tokio::test]
async fn no_putaway_rules_means_nothing_to_move() {
    let server = FakeServer::new();
    let moves = putaway::find_stock_to_move(&server).await.unwrap();
    assert!(moves.is_empty());
    let done = putaway::relocate(&server, &moves, Duration::ZERO, false)
        .await
        .unwrap();
    assert_eq!(done, 0);
}
