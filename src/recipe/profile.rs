use std::{collections::BTreeMap, fs, path::Path};

use serde::{Serialize, Deserialize};

use super::{options::{OptionPath, OptionSet, RawOptionValue}, Settings};

/*
settings:
  os: Linux
  compiler: gcc
  build_type: Release
  arch: x86_64
options:
  spdlog:shared: True
*/
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RawProfile {
  #[serde(default)]
  pub settings: BTreeMap<String, String>,
  #[serde(default)]
  pub options: BTreeMap<String, RawOptionValue>
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
  pub settings: Settings,
  pub options: OptionSet
}

impl Profile {
  pub fn load(profile_path: impl AsRef<Path>) -> Result<Self, String> {
    let profile_path: &Path = profile_path.as_ref();

    let contents: String = fs::read_to_string(profile_path)
      .map_err(|err| format!(
        "Unable to read profile '{}': {}",
        profile_path.to_string_lossy(),
        err.to_string()
      ))?;

    return Self::from_yaml_str(&contents)
      .map_err(|err_message| format!(
        "In profile '{}': {}",
        profile_path.to_string_lossy(),
        err_message
      ));
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
    let raw_profile: RawProfile = serde_yaml::from_str(contents)
      .map_err(|err| err.to_string())?;

    let mut options: OptionSet = OptionSet::new();

    for (path_str, value) in &raw_profile.options {
      options.set(&OptionPath::parse(path_str)?, value.to_option_string());
    }

    return Ok(Self {
      settings: Settings::from_map(&raw_profile.settings)?,
      options
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profile_settings_and_scoped_options() {
    let profile = Profile::from_yaml_str(
      "settings:\n  os: linux\n  build_type: Debug\noptions:\n  spdlog:shared: true\n"
    ).unwrap();

    assert_eq!(profile.settings.to_string(), "os=Linux, build_type=Debug");
    assert_eq!(profile.options.get(&OptionPath::parse("spdlog:shared").unwrap()), Some("True"));
  }

  #[test]
  fn invalid_profiles_are_rejected() {
    assert!(Profile::from_yaml_str("setting:\n  os: Linux\n").is_err());
    assert!(Profile::from_yaml_str("settings:\n  os: Plan9\n").is_err());
    assert!(Profile::from_yaml_str("options:\n  shared: true\n").is_err());
  }
}
