pub mod customer;
pub mod inventory_record;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;
