pub mod exchange;
pub mod persist;
pub mod repository;
pub mod settings;
