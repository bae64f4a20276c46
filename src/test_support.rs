use std::fs;

use tempfile::TempDir;

use crate::{package_index::PACKAGE_DESCRIPTOR_FILE_NAME, recipe::Settings};

pub const REFERENCE_MANIFEST: &'static str = include_str!("../deps.yaml");

const DEMO_INDEX: [(&'static str, &'static str); 5] = [
  ("pistache", include_str!("../demos/index/pistache/package.yaml")),
  ("spdlog", include_str!("../demos/index/spdlog/package.yaml")),
  ("nlohmann_json", include_str!("../demos/index/nlohmann_json/package.yaml")),
  ("rapidjson", include_str!("../demos/index/rapidjson/package.yaml")),
  ("cli11", include_str!("../demos/index/cli11/package.yaml"))
];

pub fn index_with(packages: &[(&str, &str)]) -> TempDir {
  let index_dir = tempfile::tempdir().unwrap();

  for (name, contents) in packages {
    let package_dir = index_dir.path().join(name);
    fs::create_dir_all(&package_dir).unwrap();
    fs::write(package_dir.join(PACKAGE_DESCRIPTOR_FILE_NAME), contents).unwrap();
  }

  index_dir
}

pub fn reference_index() -> TempDir {
  index_with(&DEMO_INDEX)
}

pub fn linux_gcc_release() -> Settings {
  let mut settings = Settings::new();
  settings.set_from_str("os", "Linux").unwrap();
  settings.set_from_str("compiler", "gcc").unwrap();
  settings.set_from_str("build_type", "Release").unwrap();
  settings.set_from_str("arch", "x86_64").unwrap();
  settings
}
