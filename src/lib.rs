// Library for tests to access modules

pub mod activity_log;
pub mod aggregator;
pub mod config;
pub mod history_repo;
pub mod models;
pub mod monitor;
pub mod parser;
pub mod routes;
pub mod transport;
pub mod version;
pub mod worker;
