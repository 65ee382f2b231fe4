pub mod config;
pub mod dashboard;
pub mod domain;
pub mod mailchimp_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
