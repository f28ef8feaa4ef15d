pub mod fetcher;
pub mod stage_file;
pub mod transform;
