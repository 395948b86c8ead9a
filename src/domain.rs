//! Search domains in Odoo's prefix ("Polish") notation.
//!
//! A domain is a flat list of terms `(field, operator, value)` and the operators
//! `&`, `|` and `!`. Adjacent top-level expressions are implicitly AND-ed by the server.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Term {
        field: String,
        operator: String,
        value: Value,
    },
    And,
    Or,
    Not,
}

impl Criterion {
    fn to_value(&self) -> Value {
        match self {
            Criterion::Term {
                field,
                operator,
                value,
            } => json!([field, operator, value]),
            Criterion::And => json!("&"),
            Criterion::Or => json!("|"),
            Criterion::Not => json!("!"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    criteria: Vec<Criterion>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.criteria.push(Criterion::Term {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Number of complete expressions at the top level of the list.
    fn expression_count(&self) -> usize {
        let terms = self
            .criteria
            .iter()
            .filter(|c| matches!(c, Criterion::Term { .. }))
            .count();
        let binary = self
            .criteria
            .iter()
            .filter(|c| matches!(c, Criterion::And | Criterion::Or))
            .count();
        terms.saturating_sub(binary)
    }

    /// Folds the implicit top-level AND into explicit `&` operators so the domain can
    /// be used as a single operand.
    fn into_expression(self) -> Vec<Criterion> {
        let count = self.expression_count();
        let mut out = Vec::with_capacity(self.criteria.len() + count);
        for _ in 1..count {
            out.push(Criterion::And);
        }
        out.extend(self.criteria);
        out
    }

    pub fn negate(self) -> Self {
        let mut criteria = vec![Criterion::Not];
        criteria.extend(self.into_expression());
        Domain { criteria }
    }

    pub fn all_of(domains: Vec<Domain>) -> Self {
        let domains: Vec<Domain> = domains.into_iter().filter(|d| !d.is_empty()).collect();
        Self::combine(domains, Criterion::And)
    }

    /// OR of every sub-domain; an empty input yields the empty (match-all) domain.
    pub fn any_of(domains: Vec<Domain>) -> Self {
        let domains: Vec<Domain> = domains.into_iter().filter(|d| !d.is_empty()).collect();
        Self::combine(domains, Criterion::Or)
    }

    fn combine(domains: Vec<Domain>, op: Criterion) -> Self {
        let mut criteria = Vec::new();
        for (i, domain) in domains.into_iter().enumerate() {
            if i > 0 {
                criteria.insert(0, op.clone());
            }
            criteria.extend(domain.into_expression());
        }
        Domain { criteria }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.criteria.iter().map(Criterion::to_value).collect())
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// `OR_i(product_id = p_i AND location_id = l_i)` over two parallel id lists.
pub fn product_location_pairs(product_ids: &[i64], location_ids: &[i64]) -> Result<Domain> {
    if product_ids.is_empty() || location_ids.is_empty() || product_ids.len() != location_ids.len()
    {
        return Err(Error::InvalidArgument(format!(
            "product ids ({}) and location ids ({}) must be non-empty and have the same length",
            product_ids.len(),
            location_ids.len()
        )));
    }
    let pairs = product_ids
        .iter()
        .zip(location_ids)
        .map(|(product, location)| {
            Domain::new()
                .term("product_id", "=", *product)
                .term("location_id", "=", *location)
        })
        .collect();
    Ok(Domain::any_of(pairs))
}
