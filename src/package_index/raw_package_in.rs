use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::recipe::options::RawOptionValue;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub enum PackageType {
  #[default]
  #[serde(rename = "library")]
  Library,
  // Header libraries produce one binary no matter the settings.
  #[serde(rename = "header-library")]
  HeaderLibrary,
  #[serde(rename = "application")]
  Application
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawExposedOption {
  pub default: RawOptionValue,
  pub allowed: Vec<RawOptionValue>
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawPrebuiltBinary {
  #[serde(default)]
  pub settings: BTreeMap<String, String>,
  #[serde(default)]
  pub options: BTreeMap<String, RawOptionValue>
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawPackageVersion {
  // Oldest first. The last revision is the one used when a requirement doesn't pin one.
  pub revisions: Vec<String>,
  #[serde(default)]
  pub requires: Vec<String>,
  pub source_build: Option<String>,
  #[serde(default)]
  pub binaries: Vec<RawPrebuiltBinary>,
  #[serde(default)]
  pub libs: Vec<String>,
  pub include_dirs: Option<Vec<String>>,
  pub lib_dirs: Option<Vec<String>>,
  #[serde(default)]
  pub defines: Vec<String>
}

/*
package_type: library
cmake_file_name: spdlog
cmake_target_name: spdlog::spdlog
options:
  shared:
    default: False
    allowed: [True, False]
versions:
  "1.13.0":
    revisions: [2bc1ba9c]
    requires: [fmt/10.2.1]
    source_build: ((not os:Android))
    binaries:
      - settings: { os: Linux, compiler: gcc, build_type: Release, arch: x86_64 }
    libs: [spdlog]
    defines: [SPDLOG_COMPILED_LIB]
*/
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawPackageDescriptor {
  #[serde(default)]
  pub package_type: PackageType,
  pub cmake_file_name: Option<String>,
  pub cmake_target_name: Option<String>,
  #[serde(default)]
  pub options: BTreeMap<String, RawExposedOption>,
  pub versions: BTreeMap<String, RawPackageVersion>
}
