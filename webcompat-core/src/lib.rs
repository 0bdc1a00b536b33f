//! Webcompat metrics core: correlates user-reported site issues with
//! platform defects and aggregates them into the dashboard report.
//!
//! The main entry point is [`pipeline::DashboardPipeline`], which refreshes
//! the [`store::IssueStore`] cache, pulls defects from a
//! [`fetch::DefectSource`], and runs the pure engine in [`report`].

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod link;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod store;
pub mod timeseries;
pub mod types;
