#![doc = "evg-activate-core: core logic library for evg-activate."]

//! This crate holds the data models, the Evergreen API contract and the
//! activation rules. It performs no network I/O itself; the CLI crate
//! provides the HTTP implementation of [`contract::EvergreenApi`].
//!
//! # Usage
//! Parse an [`expansions::EvgExpansions`], hand it to
//! [`activate::activate_task`] together with any `EvergreenApi` implementor.

pub mod activate;
pub mod contract;
pub mod error;
pub mod expansions;
pub mod taskname;
