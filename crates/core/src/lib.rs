//! Core library: mood table, scene classification and correction, library
//! catalog, track selection and streaming-link issuance.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod issuer;
pub mod models;
pub mod moods;
pub mod pipeline;
pub mod rules;
pub mod selector;
