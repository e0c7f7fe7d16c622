pub mod customers;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;

pub use customers::CustomerService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use products::ProductService;
pub use reports::ReportService;
pub use users::UserService;
