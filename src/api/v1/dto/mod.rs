pub mod homes;
pub mod page;
pub mod products;
pub mod tran;
pub mod users;
