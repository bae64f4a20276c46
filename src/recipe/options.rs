use std::{collections::BTreeMap, fmt};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::requirement_ref::is_valid_package_name;

lazy_static! {
  static ref OPTION_KEY_REGEX: Regex = Regex::new("^[A-Za-z0-9_][A-Za-z0-9_.-]*$").unwrap();
}

/*
  Option values are plain strings once loaded. Scalars are read as their
  source text, so numbers keep their spelling ("4.10" stays "4.10"). YAML
  booleans use the same spelling the package descriptors use ("True"/"False").
*/
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawOptionValue {
  Bool(bool),
  Text(String)
}

impl<'de> Deserialize<'de> for RawOptionValue {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de>
  {
    let source_text: String = String::deserialize(deserializer)?;

    return Ok(match source_text.as_str() {
      "true" | "True" | "TRUE" => Self::Bool(true),
      "false" | "False" | "FALSE" => Self::Bool(false),
      _ => Self::Text(source_text)
    });
  }
}

impl RawOptionValue {
  pub fn to_option_string(&self) -> String {
    match self {
      Self::Bool(true) => String::from("True"),
      Self::Bool(false) => String::from("False"),
      Self::Text(text) => text.clone()
    }
  }
}

/// `package:key`, as written in option rules and on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionPath {
  pub package: String,
  pub key: String
}

impl OptionPath {
  pub fn new(package: &str, key: &str) -> Result<Self, String> {
    if !is_valid_package_name(package) {
      return Err(format!("'{}' is not a valid package name for an option.", package));
    }

    if !OPTION_KEY_REGEX.is_match(key) {
      return Err(format!("'{}' is not a valid option name.", key));
    }

    return Ok(Self {
      package: package.to_string(),
      key: key.to_string()
    });
  }

  pub fn parse(path_str: &str) -> Result<Self, String> {
    match path_str.trim().split_once(':') {
      Some((package, key)) => Self::new(package, key),
      None => Err(format!(
        "Option '{}' must be written as '<package>:<option>' (for example 'spdlog:shared').",
        path_str
      ))
    }
  }
}

impl fmt::Display for OptionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.package, self.key)
  }
}

/// Parses a command line option assignment such as `spdlog:shared=True`.
pub fn parse_option_assignment(assignment: &str) -> Result<(OptionPath, String), String> {
  let (path_str, value) = assignment.split_once('=')
    .ok_or_else(|| format!(
      "Option assignment '{}' must be written as '<package>:<option>=<value>'.",
      assignment
    ))?;

  let value: &str = value.trim();

  if value.is_empty() {
    return Err(format!("Option assignment '{}' is missing a value.", assignment));
  }

  return Ok((OptionPath::parse(path_str)?, value.to_string()));
}

/// Option values scoped by package. Iteration order is always sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
  values: BTreeMap<String, BTreeMap<String, String>>
}

impl OptionSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, path: &OptionPath, value: impl Into<String>) {
    self.values
      .entry(path.package.clone())
      .or_insert_with(BTreeMap::new)
      .insert(path.key.clone(), value.into());
  }

  pub fn remove(&mut self, path: &OptionPath) -> Option<String> {
    let package_options: &mut BTreeMap<String, String> = self.values.get_mut(&path.package)?;
    let removed: Option<String> = package_options.remove(&path.key);

    if package_options.is_empty() {
      self.values.remove(&path.package);
    }

    return removed;
  }

  pub fn get(&self, path: &OptionPath) -> Option<&str> {
    return self.values
      .get(&path.package)
      .and_then(|package_options| package_options.get(&path.key))
      .map(|value| value.as_str());
  }

  pub fn package_options(&self, package_name: &str) -> Option<&BTreeMap<String, String>> {
    self.values.get(package_name)
  }

  pub fn packages(&self) -> impl Iterator<Item=&str> {
    self.values.keys().map(|name| name.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Values in `other` win over values already present.
  pub fn overlay(&mut self, other: &OptionSet) {
    for (package_name, package_options) in &other.values {
      for (key, value) in package_options {
        self.values
          .entry(package_name.clone())
          .or_insert_with(BTreeMap::new)
          .insert(key.clone(), value.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn path(path_str: &str) -> OptionPath {
    OptionPath::parse(path_str).unwrap()
  }

  #[test]
  fn option_assignments_parse() {
    let (option_path, value) = parse_option_assignment("glad:gl_version=4.5").unwrap();
    assert_eq!(option_path, path("glad:gl_version"));
    assert_eq!(value, "4.5");

    assert!(parse_option_assignment("glad:gl_version").is_err());
    assert!(parse_option_assignment("glad:gl_version=").is_err());
    assert!(parse_option_assignment("gl_version=4.5").is_err());
    assert!(parse_option_assignment("Glad:gl_version=4.5").is_err());
  }

  #[test]
  fn removing_the_last_option_drops_the_package() {
    let mut options = OptionSet::new();
    options.set(&path("glad:spec"), "gl");
    options.set(&path("glad:gl_profile"), "core");

    assert_eq!(options.remove(&path("glad:spec")), Some(String::from("gl")));
    assert_eq!(options.packages().collect::<Vec<_>>(), vec!["glad"]);
    assert_eq!(options.remove(&path("glad:gl_profile")), Some(String::from("core")));
    assert!(options.is_empty());
    assert_eq!(options.remove(&path("glad:gl_profile")), None);
  }

  #[test]
  fn overlay_prefers_new_values() {
    let mut base = OptionSet::new();
    base.set(&path("spdlog:shared"), "False");
    base.set(&path("spdlog:header_only"), "False");

    let mut overrides = OptionSet::new();
    overrides.set(&path("spdlog:shared"), "True");

    base.overlay(&overrides);
    assert_eq!(base.get(&path("spdlog:shared")), Some("True"));
    assert_eq!(base.get(&path("spdlog:header_only")), Some("False"));
  }

  #[test]
  fn raw_yaml_values_become_option_strings() {
    let values: Vec<RawOptionValue> = serde_yaml::from_str("[true, False, 4.5, core]").unwrap();
    let as_strings: Vec<String> = values.iter().map(RawOptionValue::to_option_string).collect();

    assert_eq!(as_strings, vec!["True", "False", "4.5", "core"]);
  }

  #[test]
  fn numeric_option_values_keep_their_spelling() {
    let values: BTreeMap<String, RawOptionValue> = serde_yaml::from_str("gl_version: 4.10\nabi: 011\nlevel: 3\n").unwrap();

    assert_eq!(values["gl_version"].to_option_string(), "4.10");
    assert_eq!(values["abi"].to_option_string(), "011");
    assert_eq!(values["level"].to_option_string(), "3");
  }
}
