//! Reading and writing assemblies on disk.
//!
//! # Layout
//!
//! ```text
//! cdk.out/
//! ├── manifest.json                      # AssemblyManifest
//! └── <StackName>.template.{json,yaml}   # one template per stack
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::ASSEMBLY_VERSION;
use crate::template::{Template, TemplateFormat};

use super::types::{AssemblyError, AssemblyManifest, CloudAssembly, MANIFEST_FILENAME, template_file_name};

/// Write `content` to `path` through a temp file and a rename, so readers
/// never see a partial file.
fn write_atomic(path: &Path, content: &str) -> Result<(), AssemblyError> {
  let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("assembly");
  let temp_path = path.with_file_name(format!("{file_name}.tmp"));

  fs::write(&temp_path, content).map_err(|source| AssemblyError::Write {
    path: temp_path.clone(),
    source,
  })?;
  fs::rename(&temp_path, path).map_err(|source| AssemblyError::Write {
    path: path.to_path_buf(),
    source,
  })
}

fn is_template_file(name: &str) -> bool {
  name.contains(".template.") && !name.ends_with(".tmp")
}

/// Delete `*.template.*` files in `dir` that `manifest` does not reference.
fn remove_stale_templates(dir: &Path, manifest: &AssemblyManifest) -> Result<(), AssemblyError> {
  let listed: BTreeSet<&str> = manifest.stacks.iter().map(|s| s.template_file.as_str()).collect();
  let entries = fs::read_dir(dir).map_err(|source| AssemblyError::Read {
    path: dir.to_path_buf(),
    source,
  })?;

  for entry in entries.filter_map(Result::ok) {
    let file_name = entry.file_name();
    let Some(name) = file_name.to_str() else {
      continue;
    };
    if !is_template_file(name) || listed.contains(name) {
      continue;
    }

    let path = entry.path();
    match fs::remove_file(&path) {
      Ok(()) => debug!(file = %name, "removed stale template"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => return Err(AssemblyError::Write { path, source }),
    }
  }
  Ok(())
}

fn read(path: &Path) -> Result<String, AssemblyError> {
  fs::read_to_string(path).map_err(|source| AssemblyError::Read {
    path: path.to_path_buf(),
    source,
  })
}

impl CloudAssembly {
  /// Write every template and the manifest into `dir`.
  ///
  /// Templates are written before the manifest, so a manifest on disk
  /// only ever points at complete templates. Templates from an earlier
  /// write that the new manifest no longer lists are removed afterwards.
  pub fn write_to(&self, dir: &Path, format: TemplateFormat) -> Result<AssemblyManifest, AssemblyError> {
    fs::create_dir_all(dir).map_err(|source| AssemblyError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;

    let mut manifest = self.manifest.clone();
    for entry in &mut manifest.stacks {
      entry.template_file = template_file_name(&entry.name, format);

      let template = self
        .templates
        .get(&entry.name)
        .ok_or_else(|| AssemblyError::MissingTemplate(entry.name.clone()))?;
      let rendered = template.render(format).map_err(|source| AssemblyError::Template {
        file: entry.template_file.clone(),
        source,
      })?;
      write_atomic(&dir.join(&entry.template_file), &rendered)?;
      debug!(stack = %entry.name, file = %entry.template_file, "wrote template");
    }

    let content = serde_json::to_string_pretty(&manifest).map_err(AssemblyError::SerializeManifest)?;
    write_atomic(&dir.join(MANIFEST_FILENAME), &content)?;
    remove_stale_templates(dir, &manifest)?;

    info!(dir = %dir.display(), stacks = manifest.stacks.len(), "wrote assembly");
    Ok(manifest)
  }

  /// Read an assembly previously written with [`CloudAssembly::write_to`].
  pub fn load(dir: &Path) -> Result<Self, AssemblyError> {
    let manifest_path = dir.join(MANIFEST_FILENAME);
    let content = match fs::read_to_string(&manifest_path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(AssemblyError::NotFound(dir.to_path_buf())),
      Err(source) => {
        return Err(AssemblyError::Read {
          path: manifest_path,
          source,
        });
      }
    };

    let manifest: AssemblyManifest = serde_json::from_str(&content).map_err(AssemblyError::ParseManifest)?;
    if manifest.version != ASSEMBLY_VERSION {
      return Err(AssemblyError::UnsupportedVersion(manifest.version));
    }

    let mut assembly = CloudAssembly {
      manifest: manifest.clone(),
      templates: Default::default(),
    };
    for entry in &manifest.stacks {
      if assembly.templates.contains_key(&entry.name) {
        return Err(AssemblyError::DuplicateStack(entry.name.clone()));
      }
      let format = TemplateFormat::from_file_name(&entry.template_file).unwrap_or_default();
      let body = read(&dir.join(&entry.template_file))?;
      let template = Template::parse(&body, format).map_err(|source| AssemblyError::Template {
        file: entry.template_file.clone(),
        source,
      })?;
      assembly.templates.insert(entry.name.clone(), template);
    }

    Ok(assembly)
  }

  /// Like [`CloudAssembly::load`], but a directory without a manifest is
  /// `Ok(None)`.
  pub fn load_if_present(dir: &Path) -> Result<Option<Self>, AssemblyError> {
    match Self::load(dir) {
      Ok(assembly) => Ok(Some(assembly)),
      Err(AssemblyError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }
}

/// Path of the manifest inside `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
  dir.join(MANIFEST_FILENAME)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StackConfig;
  use crate::template::Resource;
  use tempfile::TempDir;

  fn sample() -> CloudAssembly {
    let config = StackConfig::new("Test", "Vtt");
    let mut assembly = CloudAssembly::new(&config);

    let mut network = Template::new(Some("network".to_string()));
    network.resources.insert("VPC".into(), Resource::new("AWS::EC2::VPC"));
    assembly.add_stack("NetStack", vec![], network).unwrap();

    let mut app = Template::new(None);
    app.resources.insert("Cluster".into(), Resource::new("AWS::ECS::Cluster"));
    assembly.add_stack("AppStack", vec!["NetStack".into()], app).unwrap();
    assembly
  }

  #[test]
  fn write_then_load_json() {
    let temp = TempDir::new().unwrap();
    let assembly = sample();

    let manifest = assembly.write_to(temp.path(), TemplateFormat::Json).unwrap();
    assert!(temp.path().join("NetStack.template.json").exists());
    assert!(manifest_path(temp.path()).exists());
    assert_eq!(manifest.stacks[1].dependencies, vec!["NetStack".to_string()]);

    let loaded = CloudAssembly::load(temp.path()).unwrap();
    assert_eq!(loaded, assembly);
    assert_eq!(loaded.stack_names().collect::<Vec<_>>(), vec!["NetStack", "AppStack"]);
  }

  #[test]
  fn yaml_templates_are_named_and_parsed_as_yaml() {
    let temp = TempDir::new().unwrap();
    let assembly = sample();

    let manifest = assembly.write_to(temp.path(), TemplateFormat::Yaml).unwrap();
    assert_eq!(manifest.stacks[0].template_file, "NetStack.template.yaml");

    let loaded = CloudAssembly::load(temp.path()).unwrap();
    assert_eq!(loaded.templates, assembly.templates);
    assert_eq!(loaded.manifest.stacks[0].hash, assembly.manifest.stacks[0].hash);
  }

  #[test]
  fn no_temp_files_left_behind() {
    let temp = TempDir::new().unwrap();
    sample().write_to(temp.path(), TemplateFormat::Json).unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
      .unwrap()
      .filter_map(Result::ok)
      .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
      .collect();
    assert!(leftovers.is_empty());
  }

  #[test]
  fn rewrite_removes_templates_no_longer_listed() {
    let temp = TempDir::new().unwrap();
    sample().write_to(temp.path(), TemplateFormat::Json).unwrap();
    fs::write(temp.path().join("notes.txt"), "keep me").unwrap();

    let mut renamed = CloudAssembly::new(&StackConfig::new("Prod", "Vtt"));
    renamed
      .add_stack("ProdStack", vec![], Template::new(Some("prod".to_string())))
      .unwrap();
    renamed.write_to(temp.path(), TemplateFormat::Yaml).unwrap();

    let mut files: Vec<String> = fs::read_dir(temp.path())
      .unwrap()
      .filter_map(Result::ok)
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .collect();
    files.sort();
    assert_eq!(files, vec!["ProdStack.template.yaml", "manifest.json", "notes.txt"]);
  }

  #[test]
  fn manifest_entry_without_template_fails() {
    let temp = TempDir::new().unwrap();
    let mut assembly = sample();
    assembly.templates.remove("AppStack");

    let err = assembly.write_to(temp.path(), TemplateFormat::Json).unwrap_err();
    assert!(matches!(err, AssemblyError::MissingTemplate(ref stack) if stack == "AppStack"));
    assert!(!manifest_path(temp.path()).exists());
  }

  #[test]
  fn missing_manifest() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(CloudAssembly::load(temp.path()), Err(AssemblyError::NotFound(_))));
    assert!(CloudAssembly::load_if_present(temp.path()).unwrap().is_none());
  }

  #[test]
  fn unknown_version_is_rejected() {
    let temp = TempDir::new().unwrap();
    let assembly = sample();
    assembly.write_to(temp.path(), TemplateFormat::Json).unwrap();

    let mut manifest = assembly.manifest.clone();
    manifest.version = 99;
    fs::write(manifest_path(temp.path()), serde_json::to_string(&manifest).unwrap()).unwrap();

    assert!(matches!(
      CloudAssembly::load(temp.path()),
      Err(AssemblyError::UnsupportedVersion(99))
    ));
  }
}
