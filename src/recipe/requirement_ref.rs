use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
  static ref PACKAGE_NAME_REGEX: Regex = Regex::new("^[a-z0-9_][a-z0-9_.+-]*$").unwrap();
  static ref EXACT_VERSION_REGEX: Regex = Regex::new("^[a-zA-Z0-9_][a-zA-Z0-9_.+-]*$").unwrap();
  static ref REVISION_REGEX: Regex = Regex::new("^[a-zA-Z0-9]+$").unwrap();
}

// Any of these means the version is a range or a wildcard instead of a pin.
const VERSION_RANGE_CHARS: [char; 9] = ['[', ']', '*', '>', '<', '~', '^', ',', '|'];

pub fn is_valid_package_name(name: &str) -> bool {
  return PACKAGE_NAME_REGEX.is_match(name);
}

pub fn is_exact_version(version: &str) -> bool {
  return EXACT_VERSION_REGEX.is_match(version);
}

pub fn is_valid_revision(revision: &str) -> bool {
  return REVISION_REGEX.is_match(revision);
}

/// A pinned requirement: `name/version` or `name/version#revision`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequirementRef {
  pub name: String,
  pub version: String,
  pub revision: Option<String>
}

impl RequirementRef {
  pub fn new(name: &str, version: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
      revision: None
    }
  }

  pub fn parse(reference_str: &str) -> Result<Self, String> {
    let trimmed: &str = reference_str.trim();

    if trimmed.contains('@') {
      return Err(format!(
        "Requirement '{}' uses a user/channel suffix, which is not supported. Use 'name/version' or 'name/version#revision'.",
        reference_str
      ));
    }

    let (name_and_version, revision) = match trimmed.split_once('#') {
      Some((before_revision, revision)) => (before_revision, Some(revision)),
      None => (trimmed, None)
    };

    let (name, version) = name_and_version.split_once('/')
      .ok_or_else(|| format!(
        "Requirement '{}' must be of the form 'name/version' (for example 'spdlog/1.13.0').",
        reference_str
      ))?;

    if !is_valid_package_name(name) {
      return Err(format!(
        "Requirement '{}' has an invalid package name '{}'. Package names may only contain lowercase letters, digits, and the characters '_', '.', '+', '-'.",
        reference_str,
        name
      ));
    }

    if version.contains(|c: char| VERSION_RANGE_CHARS.contains(&c) || c.is_whitespace()) {
      return Err(format!(
        "Requirement '{}' does not pin an exact version. Version ranges and wildcards ('{}') are not allowed because resolution must be reproducible.",
        reference_str,
        version
      ));
    }

    if !is_exact_version(version) {
      return Err(format!(
        "Requirement '{}' has an invalid version '{}'.",
        reference_str,
        version
      ));
    }

    if let Some(revision_str) = revision {
      if !is_valid_revision(revision_str) {
        return Err(format!(
          "Requirement '{}' has an invalid revision '{}'. Revisions are alphanumeric.",
          reference_str,
          revision_str
        ));
      }
    }

    return Ok(Self {
      name: name.to_string(),
      version: version.to_string(),
      revision: revision.map(String::from)
    });
  }

  pub fn with_revision(&self, revision: &str) -> Self {
    Self {
      name: self.name.clone(),
      version: self.version.clone(),
      revision: Some(revision.to_string())
    }
  }

  pub fn without_revision(&self) -> String {
    format!("{}/{}", self.name, self.version)
  }
}

impl fmt::Display for RequirementRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.revision {
      Some(revision) => write!(f, "{}/{}#{}", self.name, self.version, revision),
      None => write!(f, "{}/{}", self.name, self.version)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_name_version_and_revision() {
    let plain = RequirementRef::parse("rapidjson/cci.20230929").unwrap();
    assert_eq!(plain, RequirementRef::new("rapidjson", "cci.20230929"));
    assert_eq!(plain.to_string(), "rapidjson/cci.20230929");

    let revisioned = RequirementRef::parse(" nlohmann_json/3.11.3#e7a1b93a ").unwrap();
    assert_eq!(revisioned.revision.as_deref(), Some("e7a1b93a"));
    assert_eq!(revisioned.to_string(), "nlohmann_json/3.11.3#e7a1b93a");
    assert_eq!(revisioned.without_revision(), "nlohmann_json/3.11.3");
  }

  #[test]
  fn version_ranges_are_not_exact() {
    for range_ref in ["spdlog/[>=1.10 <2]", "spdlog/1.*", "spdlog/~1.13", "spdlog/1.13 || 1.12"] {
      let message = RequirementRef::parse(range_ref).unwrap_err();
      assert!(message.contains("does not pin an exact version"), "{}: {}", range_ref, message);
    }
  }

  #[test]
  fn malformed_references_are_rejected() {
    assert!(RequirementRef::parse("spdlog").is_err());
    assert!(RequirementRef::parse("SpdLog/1.13.0").is_err());
    assert!(RequirementRef::parse("spdlog/").is_err());
    assert!(RequirementRef::parse("spdlog/1.13.0@user/stable").is_err());
    assert!(RequirementRef::parse("spdlog/1.13.0#not-a-rev").is_err());
  }
}
