pub mod collapse;
pub mod graph;
pub mod history;
pub mod layout;
pub mod store;
pub mod topics;
