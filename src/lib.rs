//! # oxidized-sf-audit
//!
//! Quality scoring for Salesforce artifacts.
//!
//! `oxidized-sf-audit` scores Apex classes and triggers, Flow definitions
//! and data-operation payloads against fixed point rubrics. Each rubric
//! splits a maximum score into categories (bulkification, security, error
//! handling, ...); detectors find issues and deduct points from their
//! category, which never drops below zero. Reports come out as
//! human-readable text, JSON or [SARIF], and a hook gate can block a
//! deployment before it reaches the org.
//!
//! ## Quick start
//!
//! ```
//! use oxidized_sf_audit::engine::validate;
//! use oxidized_sf_audit::rubric::Rubric;
//!
//! let src = "public with sharing class Greeter {\n}\n";
//! let report = validate(src, &Rubric::apex()).unwrap();
//! assert_eq!(report.total_score, report.max_score);
//! ```
//!
//! ## Architecture
//!
//! 1. **[`source`]**: split text into lines with literals and comments stripped.
//! 2. **[`classifier`]**: mark which lines execute inside a loop body.
//! 3. **[`detectors`]**: pluggable [`detectors::Detector`] trait with Apex,
//!    Flow ([`flow`] reader) and data-operation implementations.
//! 4. **[`engine`]**: run the detectors of one [`rubric::Rubric`] and fold
//!    their issues into a [`scoring::ValidationReport`].
//! 5. **[`policy`]** and **[`hook`]**: turn a report into a pass / warn /
//!    block verdict and a PreToolUse hook answer.
//! 6. **[`audit`]** and **[`output`]**: validate many files in parallel and
//!    render the results.
//!
//! ## Rubrics
//!
//! | Kind | Points | Categories |
//! |------|--------|------------|
//! | Apex | 150 | bulkification, security, testing, architecture, clean code, error handling, performance, documentation |
//! | Flow | 110 | design & naming, logic & structure, architecture, performance, error handling, security |
//! | Data | 130 | query efficiency, bulk safety, data integrity, security & FLS, test patterns, cleanup & isolation, documentation |
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/

pub mod audit;
pub mod classifier;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod flow;
pub mod hook;
pub mod issue;
pub mod output;
pub mod policy;
pub mod rubric;
pub mod scoring;
pub mod source;
