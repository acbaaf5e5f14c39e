pub mod db;
pub mod local;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod reducers;
pub mod session;
pub mod store;
pub mod tracker;
