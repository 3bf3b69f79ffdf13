//! Companies House API client - fetch helper, endpoint wrappers, parameters

pub mod client;
pub mod endpoints;
pub mod params;

pub use client::CompaniesHouseClient;
pub use params::{AdvancedSearchParams, CompanyNumber};
