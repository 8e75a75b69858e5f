//! Shared fixtures for the end-to-end scenarios under `tests/`.
//! Not compiled as a test binary itself — each scenario file does `mod common;`.
#![allow(dead_code)]

pub mod fixtures;
