//! Library integration tests: whole apps synthesized through the public API.

mod assembly_tests;
mod common;
mod properties_tests;
