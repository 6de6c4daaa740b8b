#![forbid(unsafe_code)]

pub mod locks;
pub mod repository;
pub mod sqlite;
