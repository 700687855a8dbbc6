//! Exam catalog parsing and schedule reconciliation for the exam planner.
//!
//! [`catalog`] turns the exam exports into [`catalog::ExamRecord`]s,
//! [`schedule`] owns the user's selection and keeps it in one backing store,
//! and [`server`] exposes both over HTTP.

pub mod account;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod search;
pub mod server;
pub mod types;
