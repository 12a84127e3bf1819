pub mod cart;
pub mod catalog;
pub mod db;
pub mod error;
pub mod format;
pub mod session;
