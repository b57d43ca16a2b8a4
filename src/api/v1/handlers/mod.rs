pub mod debug;
pub mod health;
pub mod homes;
pub mod products;
pub mod tran;
pub mod users;
