// Copyright 2026 Placelens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Placelens library — listing health diagnostics.
//!
//! Renders a public place listing in a headless browser, extracts a bounded
//! snapshot of its visible content, and converts the extracted signals into a
//! deterministic 0–100 health score with per-category breakdown and
//! recommendations. A much simpler social-profile path shares the cache and
//! grading scheme.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod renderer;
pub mod resolver;
pub mod rest;
pub mod scoring;
pub mod scrape;
pub mod social;
