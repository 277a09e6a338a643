//! # IO Module
//!
//! Interface layer between HTTP clients and the domain. Handlers translate
//! requests into domain calls and domain results back into JSON.

pub mod rest;
