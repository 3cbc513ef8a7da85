//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the restaurant collections: products, tables,
//! orders with their lines, and staff users.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod dining_table;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

// Re-export specific types to avoid conflicts
pub use dining_table::{
    Column as DiningTableColumn, Entity as DiningTable, Model as DiningTableModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, PaymentType};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
