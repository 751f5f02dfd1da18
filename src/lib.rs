#![cfg_attr(
    feature = "cargo-clippy",
    warn(clippy::pedantic, missing_debug_implementations, trivial_casts, rust_2018_idioms)
)]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::module_name_repetitions))]

//! The reusable library powering `avrogen`: generates synthetic values for a
//! schema tree, driven by per-node generator directives attached under the
//! `arg.properties` user-property.
//!
//! The entry points are [`schema::SchemaBuilder`] (or, with the
//! `apache-avro-interop` feature, [`apache_avro_interop::from_apache_avro`])
//! to build a [`schema::Schema`], and [`generator::Builder`] to turn one into
//! a [`generator::Generator`] whose `generate()` produces one [`value::Value`]
//! per call.

pub mod cache;
pub mod decimal;
pub mod directive;
pub mod error;
pub mod generator;
pub mod iterator;
pub mod length;
pub mod regexgen;
pub mod schema;
pub mod value;

#[cfg(feature = "apache-avro-interop")]
pub mod apache_avro_interop;

pub use error::{Error, Result};
pub use generator::{Builder, Generator, OptionsSource};
pub use schema::{Kind, Schema, SchemaBuilder};
pub use value::Value;
