pub mod audit_logs;
pub mod items;
pub mod order_items;
pub mod orders;
pub mod variants;

pub use audit_logs::Entity as AuditLogs;
pub use items::Entity as Items;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use variants::Entity as Variants;
