use std::{collections::BTreeMap, fmt::Write};

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

use crate::{package_index::PackageType, recipe::{RequirementRef, Settings, SettingsAxis}};

const PACKAGE_ID_LENGTH: usize = 22;

/// The settings which identify a binary of the given package type.
pub fn settings_entries_for(
  package_type: PackageType,
  settings: &Settings,
  settings_axes: &[SettingsAxis]
) -> Vec<(&'static str, String)> {
  match package_type {
    PackageType::HeaderLibrary => Vec::new(),
    PackageType::Library | PackageType::Application => settings.canonical_entries(settings_axes)
  }
}

/*
  [requires]
  spdlog/1.13.0#2bc1ba9c
  [settings]
  os=Linux
  ...
  [options]
  shared=False
*/
pub fn compute_package_id(
  reference: &RequirementRef,
  settings_entries: &[(&'static str, String)],
  options: &BTreeMap<String, String>
) -> String {
  let mut canonical: String = String::new();

  // Writing to a String can't fail.
  let _ = writeln!(canonical, "[requires]\n{}", reference);
  let _ = writeln!(canonical, "[settings]");

  for (key, value) in settings_entries {
    let _ = writeln!(canonical, "{}={}", key, value);
  }

  let _ = writeln!(canonical, "[options]");

  for (key, value) in options {
    let _ = writeln!(canonical, "{}={}", key, value);
  }

  let digest = Sha256::digest(canonical.as_bytes());
  let mut encoded: String = Base64UrlUnpadded::encode_string(&digest);
  encoded.truncate(PACKAGE_ID_LENGTH);
  return encoded;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn linux_settings() -> Settings {
    let mut settings = Settings::new();
    settings.set_from_str("os", "Linux").unwrap();
    settings.set_from_str("compiler", "gcc").unwrap();
    settings.set_from_str("build_type", "Release").unwrap();
    settings.set_from_str("arch", "x86_64").unwrap();
    settings
  }

  const ALL_AXES: [SettingsAxis; 4] = [SettingsAxis::Os, SettingsAxis::Compiler, SettingsAxis::BuildType, SettingsAxis::Arch];

  #[test]
  fn package_id_is_stable_and_sensitive_to_inputs() {
    let reference = RequirementRef::new("spdlog", "1.13.0").with_revision("2bc1ba9c");
    let entries = settings_entries_for(PackageType::Library, &linux_settings(), &ALL_AXES);
    let mut options: BTreeMap<String, String> = BTreeMap::new();
    options.insert(String::from("shared"), String::from("False"));

    let first = compute_package_id(&reference, &entries, &options);
    assert_eq!(first.len(), PACKAGE_ID_LENGTH);
    assert_eq!(first, compute_package_id(&reference, &entries, &options));

    options.insert(String::from("shared"), String::from("True"));
    assert_ne!(first, compute_package_id(&reference, &entries, &options));

    let mut debug_settings = linux_settings();
    debug_settings.set_from_str("build_type", "Debug").unwrap();
    let debug_entries = settings_entries_for(PackageType::Library, &debug_settings, &ALL_AXES);
    assert_ne!(
      compute_package_id(&reference, &entries, &BTreeMap::new()),
      compute_package_id(&reference, &debug_entries, &BTreeMap::new())
    );
  }

  #[test]
  fn header_library_ids_ignore_settings() {
    let reference = RequirementRef::new("nlohmann_json", "3.11.3").with_revision("e7a1b93a");
    let mut windows_settings = linux_settings();
    windows_settings.set_from_str("os", "Windows").unwrap();
    windows_settings.set_from_str("compiler", "msvc").unwrap();

    assert!(settings_entries_for(PackageType::HeaderLibrary, &windows_settings, &ALL_AXES).is_empty());
    assert_eq!(
      compute_package_id(&reference, &settings_entries_for(PackageType::HeaderLibrary, &linux_settings(), &ALL_AXES), &BTreeMap::new()),
      compute_package_id(&reference, &settings_entries_for(PackageType::HeaderLibrary, &windows_settings, &ALL_AXES), &BTreeMap::new())
    );
  }
}
