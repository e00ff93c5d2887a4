#![doc = "photobatch-core: core upload pipeline for photobatch."]

//! This crate holds the upload pipeline proper: resolving input paths and URLs
//! into upload items, deduplicating local files against a content-hash ledger,
//! dispatching the batch to a remote photo service, and reconciling the
//! per-item results back into the ledger.
//!
//! Concrete remote clients live outside this crate. They plug in through the
//! [`contract::PhotoService`] trait.
//!
//! # Usage
//! The main entrypoint is [`upload::upload`]. The individual phases
//! ([`resolve`], [`dispatch`], [`report`]) are public for callers that need
//! to drive them separately.

pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod item;
pub mod ledger;
pub mod report;
pub mod resolve;
pub mod upload;

pub use error::{ErrorKind, PipelineError, Result};
