//! One helper per ERP area. Each owns its model names and field lists and borrows the
//! shared [`ObjectRpc`](crate::odoo::ObjectRpc) connection.

mod contact;
mod product;
mod purchase;
mod sales;
mod warehouse;

pub use contact::ContactClient;
pub use product::{ProductClient, ProductTemplateClient};
pub use purchase::PurchaseOrderClient;
pub use sales::{Quotation, QuotationLine, SalesOrderClient};
pub use warehouse::WarehouseClient;
