use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use super::{options::RawOptionValue, settings::SettingsAxis};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub enum BuildPolicy {
  // Only prebuilt or already cached binaries are used.
  #[default]
  #[serde(rename = "never")]
  Never,
  #[serde(rename = "missing")]
  Missing,
  #[serde(rename = "always")]
  Always
}

impl BuildPolicy {
  pub fn name_string(&self) -> &'static str {
    match self {
      Self::Never => "never",
      Self::Missing => "missing",
      Self::Always => "always"
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(deny_unknown_fields)]
pub enum GeneratorKind {
  CMakeDeps,
  CMakeToolchain
}

impl GeneratorKind {
  pub fn name_string(&self) -> &'static str {
    match self {
      Self::CMakeDeps => "CMakeDeps",
      Self::CMakeToolchain => "CMakeToolchain"
    }
  }
}

/*
requires:
  - spdlog/1.13.0
  - ref: glad/0.1.36
    when: ((not os:Windows))
*/
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RawRequirementIn {
  Plain(String),
  Conditional(RawConditionalRequirement)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawConditionalRequirement {
  #[serde(rename = "ref")]
  pub reference: String,
  pub when: Option<String>
}

/*
config_options:
  - when: ((os:Windows))
    remove: [pistache:shared]
    set:
      spdlog:shared: True
*/
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawOptionRule {
  pub when: Option<String>,
  pub set: Option<BTreeMap<String, RawOptionValue>>,
  pub remove: Option<Vec<String>>
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RawRecipe {
  pub name: Option<String>,
  #[serde(default)]
  pub build_policy: BuildPolicy,
  pub settings: Vec<SettingsAxis>,
  #[serde(default)]
  pub generators: Vec<GeneratorKind>,
  #[serde(default)]
  pub requires: Vec<RawRequirementIn>,
  pub options: Option<BTreeMap<String, BTreeMap<String, RawOptionValue>>>,
  pub config_options: Option<Vec<RawOptionRule>>
}
