use tracing::info;

use crate::domain::Domain;
use crate::error::Result;
use crate::models::Partner;
use crate::odoo::{decode_records, ObjectRpc};

const MODEL: &str = "res.partner";
const FIELDS: &[&str] = &["id", "name", "email", "phone"];

pub struct ContactClient<'a, C: ObjectRpc> {
    rpc: &'a C,
}

impl<'a, C: ObjectRpc> ContactClient<'a, C> {
    pub fn new(rpc: &'a C) -> Self {
        ContactClient { rpc }
    }

    pub async fn fetch_ids(&self) -> Result<Vec<i64>> {
        info!("fetching contact ids");
        self.rpc.search(MODEL, &Domain::new()).await
    }

    pub async fn fetch_customer_ids(&self) -> Result<Vec<i64>> {
        info!("fetching customer ids");
        let domain = Domain::new().term("customer_rank", ">=", 1);
        self.rpc.search(MODEL, &domain).await
    }

    pub async fn fetch_vendor_ids(&self) -> Result<Vec<i64>> {
        info!("fetching vendor ids");
        let domain = Domain::new().term("supplier_rank", ">=", 1);
        self.rpc.search(MODEL, &domain).await
    }

    pub async fn fetch_details(&self, ids: &[i64]) -> Result<Vec<Partner>> {
        info!(count = ids.len(), "fetching contact details");
        let value = self.rpc.read(MODEL, ids, FIELDS).await?;
        decode_records(MODEL, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odoo::mock::MockRpc;
    use serde_json::json;

    #[tokio::test]
    async fn customers_and_vendors_filter_on_rank() {
        let rpc = MockRpc::new().reply(MODEL, "search", json!([1, 2, 3]));
        let client = ContactClient::new(&rpc);
        assert_eq!(client.fetch_customer_ids().await.unwrap(), vec![1, 2, 3]);
        client.fetch_vendor_ids().await.unwrap();

        let calls = rpc.calls_to(MODEL, "search");
        assert_eq!(calls[0].args, json!([[["customer_rank", ">=", 1]]]));
        assert_eq!(calls[1].args, json!([[["supplier_rank", ">=", 1]]]));
    }

    #[tokio::test]
    async fn details_decode_partners() {
        let rpc = MockRpc::new().reply(
            MODEL,
            "read",
            json!([{"id": 9, "name": "Acme", "email": false, "phone": "+1 555"}]),
        );
        let partners = ContactClient::new(&rpc).fetch_details(&[9]).await.unwrap();
        assert_eq!(partners[0].name, "Acme");
        assert!(partners[0].email.is_none());
    }
}
