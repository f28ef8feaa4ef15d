pub mod preview;
pub mod table;
