//! CLI integration tests: synthesize, reload and diff assemblies on disk.

mod common;
mod diff_tests;
mod synth_tests;
