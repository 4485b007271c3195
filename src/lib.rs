//! Airwatch - the core of an urban air-quality companion app.
//!
//! # Overview
//!
//! Airwatch turns an AQI reading into something a resident can act on: a
//! severity tier with a colour, plain-language health guidance and a
//! dashboard that keeps both in step with the latest snapshot. Residents can
//! also report pollution incidents and follow their complaints.
//!
//! Guidance is written either by a fixed rule table or by a hosted text
//! generator. A failing, slow or silent generator always falls back to the
//! rule table, so the dashboard never goes without advice.
//!
//! # Modules
//!
//! - [`classify`]: AQI severity tiers and colour tokens
//! - [`guidance`]: Health guidance with delegated generation and fallback
//! - [`text_generation`]: Text-generation providers
//! - [`dashboard`]: Snapshot-then-guidance orchestration and view lifecycle
//! - [`auth`] and [`session`]: Login, registration and the signed-in user
//! - [`complaints`]: Complaint submission and tracking
//! - [`provider`]: The data-provider boundary
//! - [`mock`]: In-process backend backed by [`storage`]
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration

pub mod api;
pub mod auth;
pub mod classify;
pub mod complaints;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guidance;
pub mod mock;
pub mod model;
pub mod provider;
pub mod session;
pub mod storage;
pub mod text_generation;
