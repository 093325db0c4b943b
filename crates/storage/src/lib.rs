#![forbid(unsafe_code)]

pub mod bank_file;
pub mod cache;
pub mod catalog;
pub mod fs;
pub mod repository;
pub mod sqlite;

pub use cache::{BankCache, LoadedBank};
pub use catalog::{BankCatalog, BankDescriptor, BankPaths};
