pub mod adhoc;
pub mod catalog;
pub mod repo;
pub mod schema;
