pub mod raw_package_in;

use std::{collections::{BTreeMap, HashMap}, fs, path::{Path, PathBuf}, rc::Rc};

use crate::{
  recipe::{
    RequirementRef,
    Settings,
    parsers::{SettingsConditionTree, parse_condition_with_diagnostic},
    requirement_ref::is_exact_version,
    options::RawOptionValue
  },
  resolver::ResolveFailureReason
};

pub use self::raw_package_in::PackageType;
use self::raw_package_in::{RawPackageDescriptor, RawPackageVersion, RawExposedOption, RawPrebuiltBinary};

pub const PACKAGE_DESCRIPTOR_FILE_NAME: &'static str = "package.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposedOption {
  pub default: String,
  pub allowed: Vec<String>
}

#[derive(Debug, Clone)]
pub struct PrebuiltBinary {
  pub settings: Settings,
  pub options: BTreeMap<String, String>
}

#[derive(Debug, Clone)]
pub struct PackageVersionInfo {
  pub revisions: Vec<String>,
  pub requires: Vec<RequirementRef>,
  pub source_build: Option<SettingsConditionTree>,
  pub binaries: Vec<PrebuiltBinary>,
  pub libs: Vec<String>,
  pub include_dirs: Vec<String>,
  pub lib_dirs: Vec<String>,
  pub defines: Vec<String>
}

impl PackageVersionInfo {
  pub fn latest_revision(&self) -> &str {
    // Descriptors with no revisions are rejected when loaded.
    self.revisions.last().map(|revision| revision.as_str()).unwrap_or_default()
  }

  pub fn has_revision(&self, revision: &str) -> bool {
    self.revisions.iter().any(|existing| existing == revision)
  }
}

#[derive(Debug, Clone)]
pub struct PackageDescriptor {
  pub name: String,
  pub package_type: PackageType,
  pub cmake_file_name: String,
  pub cmake_target_name: String,
  pub options: BTreeMap<String, ExposedOption>,
  pub versions: BTreeMap<String, PackageVersionInfo>
}

impl PackageDescriptor {
  pub fn version(&self, version: &str) -> Option<&PackageVersionInfo> {
    self.versions.get(version)
  }

  pub fn available_versions(&self) -> Vec<&str> {
    self.versions.keys().map(|version| version.as_str()).collect()
  }

  /*
    Defaults overlaid with the given values. Every given key must be an option
    this package exposes, and every value one it allows.
  */
  pub fn effective_options(
    &self,
    overrides: Option<&BTreeMap<String, String>>
  ) -> Result<BTreeMap<String, String>, String> {
    let mut effective: BTreeMap<String, String> = self.options
      .iter()
      .map(|(key, exposed)| (key.clone(), exposed.default.clone()))
      .collect();

    for (key, value) in overrides.into_iter().flatten() {
      let exposed: &ExposedOption = self.options.get(key)
        .ok_or_else(|| format!(
          "Package '{}' has no option '{}'. Available options: [{}]",
          self.name,
          key,
          self.options.keys().cloned().collect::<Vec<String>>().join(", ")
        ))?;

      if !exposed.allowed.contains(value) {
        return Err(format!(
          "'{}' is not an allowed value for option '{}:{}'. Allowed values: [{}]",
          value,
          self.name,
          key,
          exposed.allowed.join(", ")
        ));
      }

      effective.insert(key.clone(), value.clone());
    }

    return Ok(effective);
  }
}

/// The local directory of package descriptors, `<root>/<name>/package.yaml`.
/// Descriptors are only read when a package is asked for.
pub struct PackageIndex {
  root: PathBuf,
  loaded: HashMap<String, Option<Rc<PackageDescriptor>>>
}

impl PackageIndex {
  pub fn new(root: impl AsRef<Path>) -> Self {
    Self {
      root: root.as_ref().to_path_buf(),
      loaded: HashMap::new()
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn ensure_exists(&self) -> Result<(), ResolveFailureReason> {
    if self.root.is_dir() {
      return Ok(());
    }

    return Err(ResolveFailureReason::Resolution(format!(
      "The package index was not found at '{}'. Pass '--index <dir>' to use a different index.",
      self.root.to_string_lossy()
    )));
  }

  pub fn find_package(&mut self, package_name: &str) -> Result<Option<Rc<PackageDescriptor>>, ResolveFailureReason> {
    if let Some(already_loaded) = self.loaded.get(package_name) {
      return Ok(already_loaded.clone());
    }

    let descriptor_path: PathBuf = self.root
      .join(package_name)
      .join(PACKAGE_DESCRIPTOR_FILE_NAME);

    let maybe_descriptor: Option<Rc<PackageDescriptor>> = if descriptor_path.is_file() {
      Some(Rc::new(load_descriptor(package_name, &descriptor_path)?))
    }
    else {
      None
    };

    self.loaded.insert(package_name.to_string(), maybe_descriptor.clone());
    return Ok(maybe_descriptor);
  }
}

fn load_descriptor(package_name: &str, descriptor_path: &Path) -> Result<PackageDescriptor, ResolveFailureReason> {
  let contents: String = fs::read_to_string(descriptor_path)
    .map_err(|err| ResolveFailureReason::Io(format!(
      "Unable to read package descriptor '{}': {}",
      descriptor_path.to_string_lossy(),
      err.to_string()
    )))?;

  let to_configuration_error = |err_message: String| ResolveFailureReason::Configuration(format!(
    "Error loading package descriptor for '{}' ({}):\n\t{}",
    package_name,
    descriptor_path.to_string_lossy(),
    err_message
  ));

  let raw_descriptor: RawPackageDescriptor = serde_yaml::from_str(&contents)
    .map_err(|err| to_configuration_error(err.to_string()))?;

  return descriptor_from_raw(package_name, raw_descriptor)
    .map_err(to_configuration_error);
}

pub fn descriptor_from_raw(package_name: &str, raw_descriptor: RawPackageDescriptor) -> Result<PackageDescriptor, String> {
  let RawPackageDescriptor {
    package_type,
    cmake_file_name,
    cmake_target_name,
    options: raw_options,
    versions: raw_versions
  } = raw_descriptor;

  let mut options: BTreeMap<String, ExposedOption> = BTreeMap::new();

  for (key, RawExposedOption { default, allowed }) in raw_options {
    let exposed = ExposedOption {
      default: default.to_option_string(),
      allowed: allowed.iter().map(RawOptionValue::to_option_string).collect()
    };

    if !exposed.allowed.contains(&exposed.default) {
      return Err(format!(
        "The default value '{}' of option '{}' is not one of its allowed values.",
        exposed.default,
        key
      ));
    }

    options.insert(key, exposed);
  }

  let mut versions: BTreeMap<String, PackageVersionInfo> = BTreeMap::new();

  for (version, raw_version) in raw_versions {
    if !is_exact_version(&version) {
      return Err(format!("'{}' is not a valid package version.", version));
    }

    let version_info: PackageVersionInfo = version_from_raw(raw_version)
      .map_err(|err_message| format!("In version '{}': {}", version, err_message))?;

    versions.insert(version, version_info);
  }

  let cmake_file_name: String = cmake_file_name.unwrap_or_else(|| package_name.to_string());
  let cmake_target_name: String = cmake_target_name
    .unwrap_or_else(|| format!("{}::{}", cmake_file_name, cmake_file_name));

  return Ok(PackageDescriptor {
    name: package_name.to_string(),
    package_type,
    cmake_file_name,
    cmake_target_name,
    options,
    versions
  });
}

fn version_from_raw(raw_version: RawPackageVersion) -> Result<PackageVersionInfo, String> {
  let RawPackageVersion {
    revisions,
    requires,
    source_build,
    binaries,
    libs,
    include_dirs,
    lib_dirs,
    defines
  } = raw_version;

  if revisions.is_empty() {
    return Err(String::from("At least one revision must be listed."));
  }

  let mut parsed_requires: Vec<RequirementRef> = Vec::new();

  for reference_str in requires {
    parsed_requires.push(RequirementRef::parse(&reference_str)?);
  }

  let source_build: Option<SettingsConditionTree> = match source_build {
    None => None,
    Some(condition_str) => Some(
      parse_condition_with_diagnostic(&condition_str)
        .map_err(|err_message| format!("In 'source_build': {}", err_message))?
    )
  };

  let mut prebuilt_binaries: Vec<PrebuiltBinary> = Vec::new();

  for RawPrebuiltBinary { settings, options } in binaries {
    prebuilt_binaries.push(PrebuiltBinary {
      settings: Settings::from_map(&settings)
        .map_err(|err_message| format!("In a prebuilt binary: {}", err_message))?,
      options: options
        .into_iter()
        .map(|(key, value)| (key, value.to_option_string()))
        .collect()
    });
  }

  return Ok(PackageVersionInfo {
    revisions,
    requires: parsed_requires,
    source_build,
    binaries: prebuilt_binaries,
    libs,
    include_dirs: include_dirs.unwrap_or_else(|| vec![String::from("include")]),
    lib_dirs: lib_dirs.unwrap_or_else(|| vec![String::from("lib")]),
    defines
  });
}
