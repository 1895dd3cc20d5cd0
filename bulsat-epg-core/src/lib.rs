#![doc = "bulsat-epg-core: core logic library for bulsat-epg."]

//! This crate holds the data model, the Bulsatcom session handshake, channel
//! and guide acquisition, the M3U/XMLTV renderers and the pipeline that ties
//! them together. The CLI crate only loads configuration and wires the
//! concrete implementations in.
//!
//! # Usage
//! Build a [`config::PipelineConfig`], a [`client::BulsatClient`] and a
//! [`state::StateFile`], then call [`pipeline::run_pipeline`].

pub mod catalog;
pub mod cipher;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod guide;
pub mod pipeline;
pub mod render;
pub mod retry;
pub mod session;
pub mod state;

pub use error::{Error, Result};
