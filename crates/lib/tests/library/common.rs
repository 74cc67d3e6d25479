use vttcloud_lib::assembly::CloudAssembly;
use vttcloud_lib::template::Template;
use vttcloud_lib::{App, AppKind, FoundryOptions, StackConfig};

/// Stage/project pairs exercised by the property tests.
pub const CONFIGS: &[(&str, &str)] = &[
  ("Dev", "FoundryVtt"),
  ("dev", "FoundryVtt"),
  ("Prod", "Tabletop"),
  ("qa", "x"),
];

pub fn synth(kind: AppKind, stage: &str, project: &str) -> CloudAssembly {
  synth_with(kind, stage, project, &FoundryOptions::default())
}

pub fn synth_with(kind: AppKind, stage: &str, project: &str, options: &FoundryOptions) -> CloudAssembly {
  App::build(kind, &StackConfig::new(stage, project), options)
    .expect("app builds")
    .synth()
    .expect("app synthesizes")
}

/// Every export and import name across all templates of an assembly.
pub fn all_keys(assembly: &CloudAssembly) -> Vec<String> {
  let mut keys: Vec<String> = assembly
    .templates
    .values()
    .flat_map(|t: &Template| {
      t.export_names()
        .into_iter()
        .map(str::to_string)
        .chain(t.import_names())
        .collect::<Vec<_>>()
    })
    .collect();
  keys.sort();
  keys.dedup();
  keys
}
