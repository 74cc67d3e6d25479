//! Synthesized output: templates plus a manifest, on disk or in memory.

pub mod diff;
mod storage;
mod types;

pub use diff::{AssemblyDiff, ChangeKind, StackStatus, TemplateDiff, diff_assemblies, diff_templates};
pub use storage::manifest_path;
pub use types::{AssemblyError, AssemblyManifest, CloudAssembly, MANIFEST_FILENAME, StackManifest, template_file_name};
