use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
  common::{basic_configure_replace, make_c_identifier},
  recipe::settings::AxisValue,
  resolver::{binary_plan::InstalledPackage, ResolvedPackage}
};

use super::{GeneratedFile, GeneratorInput};

pub const AGGREGATE_FILE_NAME: &'static str = "deps.cmake";

const CONFIG_TEMPLATE: &'static str = r#"# @REFERENCE@ (package id @PACKAGE_ID@)
include_guard(GLOBAL)
include(CMakeFindDependencyMacro)
@FIND_DEPENDENCIES@
set(@FILE_NAME@_FOUND TRUE)
set(@FILE_NAME@_VERSION_STRING "@VERSION@")

file(GLOB @VAR_PREFIX@_TARGET_FILES "${CMAKE_CURRENT_LIST_DIR}/@FILE_NAME@-Target-*.cmake")
foreach(target_file IN LISTS @VAR_PREFIX@_TARGET_FILES)
  include("${target_file}")
endforeach()
"#;

const CONFIG_VERSION_TEMPLATE: &'static str = r#"set(PACKAGE_VERSION "@VERSION@")

if(PACKAGE_FIND_VERSION AND NOT PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)
  set(PACKAGE_VERSION_COMPATIBLE FALSE)
else()
  set(PACKAGE_VERSION_COMPATIBLE TRUE)
  if(PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)
    set(PACKAGE_VERSION_EXACT TRUE)
  endif()
endif()
"#;

const TARGET_TEMPLATE: &'static str = r#"# @REFERENCE@ for @SETTINGS@
set(@VAR_PREFIX@_PACKAGE_FOLDER_@CONFIG_UPPER@ "@PACKAGE_FOLDER@")
set(@VAR_PREFIX@_INCLUDE_DIRS_@CONFIG_UPPER@ @INCLUDE_DIRS@)
set(@VAR_PREFIX@_LIB_DIRS_@CONFIG_UPPER@ @LIB_DIRS@)
set(@VAR_PREFIX@_LIBS_@CONFIG_UPPER@ @LIBS@)
set(@VAR_PREFIX@_DEFINITIONS_@CONFIG_UPPER@ @DEFINES@)
set(@VAR_PREFIX@_DEPENDENCY_TARGETS_@CONFIG_UPPER@ @DEPENDENCY_TARGETS@)

if(NOT TARGET @TARGET_NAME@)
  add_library(@TARGET_NAME@ INTERFACE IMPORTED)
endif()

set_property(TARGET @TARGET_NAME@ APPEND PROPERTY INTERFACE_INCLUDE_DIRECTORIES
  "$<$<CONFIG:@CONFIG@>:${@VAR_PREFIX@_INCLUDE_DIRS_@CONFIG_UPPER@}>"
)
set_property(TARGET @TARGET_NAME@ APPEND PROPERTY INTERFACE_LINK_DIRECTORIES
  "$<$<CONFIG:@CONFIG@>:${@VAR_PREFIX@_LIB_DIRS_@CONFIG_UPPER@}>"
)
set_property(TARGET @TARGET_NAME@ APPEND PROPERTY INTERFACE_LINK_LIBRARIES
  "$<$<CONFIG:@CONFIG@>:${@VAR_PREFIX@_LIBS_@CONFIG_UPPER@}>"
  "$<$<CONFIG:@CONFIG@>:${@VAR_PREFIX@_DEPENDENCY_TARGETS_@CONFIG_UPPER@}>"
)
set_property(TARGET @TARGET_NAME@ APPEND PROPERTY INTERFACE_COMPILE_DEFINITIONS
  "$<$<CONFIG:@CONFIG@>:${@VAR_PREFIX@_DEFINITIONS_@CONFIG_UPPER@}>"
)
"#;

const AGGREGATE_TEMPLATE: &'static str = r#"# Dependencies of @RECIPE_NAME@ for @SETTINGS@
list(PREPEND CMAKE_PREFIX_PATH "${CMAKE_CURRENT_LIST_DIR}")

@FIND_PACKAGES@
"#;

lazy_static! {
  static ref CMAKE_VERSION_REGEX: Regex = Regex::new(r"^\d+(\.\d+){0,3}$").unwrap();
}

// CMake only accepts major[.minor[.patch[.tweak]]] in the version slot.
fn exact_version_args(version: &str) -> String {
  if CMAKE_VERSION_REGEX.is_match(version) {
    return format!(" {} EXACT", version);
  }

  return String::new();
}

fn cmake_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

fn quoted_list<'a>(items: impl IntoIterator<Item=&'a String>, prefix: Option<&str>) -> String {
  let quoted: Vec<String> = items
    .into_iter()
    .map(|item| match prefix {
      Some(prefix) => format!("\"{}/{}\"", prefix, item),
      None => format!("\"{}\"", item)
    })
    .collect();

  if quoted.is_empty() {
    return String::from("\"\"");
  }

  return quoted.join(" ");
}

fn find_dependency_lines(input: &GeneratorInput, package: &ResolvedPackage) -> Result<String, String> {
  let mut lines: Vec<String> = Vec::new();

  for dependency_name in &package.dependency_names {
    let dependency: &ResolvedPackage = input.graph.find(dependency_name)
      .ok_or_else(|| format!("'{}' depends on '{}', which was not resolved.", package.reference, dependency_name))?;

    lines.push(format!(
      "find_dependency({}{} CONFIG)",
      dependency.descriptor.cmake_file_name,
      exact_version_args(dependency.version())
    ));
  }

  return Ok(lines.join("\n"));
}

fn dependency_targets(input: &GeneratorInput, package: &ResolvedPackage) -> Vec<String> {
  package.dependency_names
    .iter()
    .filter_map(|dependency_name| input.graph.find(dependency_name))
    .map(|dependency| dependency.descriptor.cmake_target_name.clone())
    .collect()
}

fn render_package_files(input: &GeneratorInput, installed: &InstalledPackage) -> Result<Vec<GeneratedFile>, String> {
  let package: &ResolvedPackage = installed.package;
  let file_name: &str = &package.descriptor.cmake_file_name;
  let var_prefix: String = make_c_identifier(file_name);
  let config: &str = input.graph.settings.build_type_or_default().name_string();
  let package_folder: String = cmake_path(&installed.folder);

  let config_contents: String = basic_configure_replace(
    CONFIG_TEMPLATE,
    [
      ("REFERENCE", package.reference.to_string()),
      ("PACKAGE_ID", package.package_id.clone()),
      ("FIND_DEPENDENCIES", find_dependency_lines(input, package)?),
      ("FILE_NAME", file_name.to_string()),
      ("VAR_PREFIX", var_prefix.clone()),
      ("VERSION", package.version().to_string())
    ]
  );

  let version_contents: String = basic_configure_replace(
    CONFIG_VERSION_TEMPLATE,
    [("VERSION", package.version().to_string())]
  );

  let target_contents: String = basic_configure_replace(
    TARGET_TEMPLATE,
    [
      ("REFERENCE", package.reference.to_string()),
      ("SETTINGS", input.graph.settings.to_string()),
      ("VAR_PREFIX", var_prefix),
      ("CONFIG_UPPER", config.to_uppercase()),
      ("CONFIG", config.to_string()),
      ("PACKAGE_FOLDER", package_folder.clone()),
      ("INCLUDE_DIRS", quoted_list(&package.version_info.include_dirs, Some(package_folder.as_str()))),
      ("LIB_DIRS", quoted_list(&package.version_info.lib_dirs, Some(package_folder.as_str()))),
      ("LIBS", quoted_list(&package.version_info.libs, None)),
      ("DEFINES", quoted_list(&package.version_info.defines, None)),
      ("DEPENDENCY_TARGETS", quoted_list(&dependency_targets(input, package), None)),
      ("TARGET_NAME", package.descriptor.cmake_target_name.clone())
    ]
  );

  return Ok(vec![
    GeneratedFile::new(format!("{}-config.cmake", file_name), config_contents),
    GeneratedFile::new(format!("{}-config-version.cmake", file_name), version_contents),
    GeneratedFile::new(format!("{}-Target-{}.cmake", file_name, config), target_contents)
  ]);
}

pub fn render_cmake_deps(input: &GeneratorInput) -> Result<Vec<GeneratedFile>, String> {
  let mut files: Vec<GeneratedFile> = Vec::new();

  for installed in input.installed {
    files.extend(render_package_files(input, installed)?);
  }

  let find_packages: Vec<String> = input.graph.direct_packages()
    .map(|package| format!(
      "find_package({}{} CONFIG REQUIRED)",
      package.descriptor.cmake_file_name,
      exact_version_args(package.version())
    ))
    .collect();

  files.push(GeneratedFile::new(
    AGGREGATE_FILE_NAME,
    basic_configure_replace(
      AGGREGATE_TEMPLATE,
      [
        ("RECIPE_NAME", input.graph.recipe_name.clone()),
        ("SETTINGS", input.graph.settings.to_string()),
        ("FIND_PACKAGES", find_packages.join("\n"))
      ]
    )
  ));

  return Ok(files);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    package_cache::LocalPackageCache,
    package_index::PackageIndex,
    recipe::{BuildPolicy, ManifestRecipe, OptionSet},
    resolver::{binary_plan::{execute_plan, plan_binaries}, resolve_graph},
    test_support::{index_with, linux_gcc_release, reference_index, REFERENCE_MANIFEST}
  };

  fn file_named<'a>(files: &'a [GeneratedFile], file_name: &str) -> &'a GeneratedFile {
    files.iter()
      .find(|file| file.file_name == file_name)
      .unwrap_or_else(|| panic!("'{}' was not generated", file_name))
  }

  #[test]
  fn reference_graph_produces_lookup_files_for_every_package() {
    let index_dir = reference_index();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = LocalPackageCache::new(cache_dir.path());
    let recipe = ManifestRecipe::from_yaml_str(REFERENCE_MANIFEST, "labs").unwrap();
    let graph = resolve_graph(&recipe, &linux_gcc_release(), &OptionSet::new(), &mut PackageIndex::new(index_dir.path())).unwrap();
    let installed = execute_plan(&graph, plan_binaries(&graph, BuildPolicy::Missing, &cache).unwrap(), &cache).unwrap();

    let files = render_cmake_deps(&GeneratorInput { graph: &graph, installed: &installed }).unwrap();

    for file_name in ["Pistache", "spdlog", "nlohmann_json", "RapidJSON", "CLI11"] {
      file_named(&files, &format!("{}-config.cmake", file_name));
      file_named(&files, &format!("{}-config-version.cmake", file_name));
      file_named(&files, &format!("{}-Target-Release.cmake", file_name));
    }

    let aggregate = &file_named(&files, AGGREGATE_FILE_NAME).contents;
    assert!(aggregate.contains("find_package(Pistache CONFIG REQUIRED)"), "{}", aggregate);
    assert!(aggregate.contains("find_package(RapidJSON CONFIG REQUIRED)"), "{}", aggregate);
    assert!(aggregate.contains("find_package(spdlog 1.13.0 EXACT CONFIG REQUIRED)"), "{}", aggregate);
    assert!(aggregate.contains("find_package(CLI11 2.4.2 EXACT CONFIG REQUIRED)"), "{}", aggregate);

    let spdlog_target = &file_named(&files, "spdlog-Target-Release.cmake").contents;
    assert!(spdlog_target.contains("add_library(spdlog::spdlog INTERFACE IMPORTED)"), "{}", spdlog_target);
    assert!(spdlog_target.contains("set(spdlog_LIBS_RELEASE \"spdlog\")"), "{}", spdlog_target);
    assert!(spdlog_target.contains("set(spdlog_DEFINITIONS_RELEASE \"SPDLOG_COMPILED_LIB\")"), "{}", spdlog_target);
    assert!(spdlog_target.contains("$<$<CONFIG:Release>:"), "{}", spdlog_target);
    assert!(!spdlog_target.contains('\\'), "{}", spdlog_target);

    let version_file = &file_named(&files, "nlohmann_json-config-version.cmake").contents;
    assert!(version_file.contains("set(PACKAGE_VERSION \"3.11.3\")"), "{}", version_file);
  }

  #[test]
  fn transitive_requirements_are_linked_and_found() {
    let index_dir = index_with(&[
      ("spdlog", "versions:\n  \"1.13.0\":\n    revisions: [bb22]\n    requires: [fmt/10.2.1]\n    libs: [spdlog]\n"),
      ("fmt", "cmake_target_name: fmt::fmt\nversions:\n  \"10.2.1\":\n    revisions: [cc33]\n    libs: [fmt]\n")
    ]);
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = LocalPackageCache::new(cache_dir.path());
    let recipe = ManifestRecipe::from_yaml_str("settings: [build_type]\nrequires: [spdlog/1.13.0]\n", "transitive").unwrap();

    let mut settings = crate::recipe::Settings::new();
    settings.set_from_str("build_type", "Debug").unwrap();

    let graph = resolve_graph(&recipe, &settings, &OptionSet::new(), &mut PackageIndex::new(index_dir.path())).unwrap();
    let installed = execute_plan(&graph, plan_binaries(&graph, BuildPolicy::Missing, &cache).unwrap(), &cache).unwrap();
    let files = render_cmake_deps(&GeneratorInput { graph: &graph, installed: &installed }).unwrap();

    let spdlog_config = &file_named(&files, "spdlog-config.cmake").contents;
    assert!(spdlog_config.contains("find_dependency(fmt 10.2.1 EXACT CONFIG)"), "{}", spdlog_config);

    let spdlog_target = &file_named(&files, "spdlog-Target-Debug.cmake").contents;
    assert!(spdlog_target.contains("set(spdlog_DEPENDENCY_TARGETS_DEBUG \"fmt::fmt\")"), "{}", spdlog_target);

    let aggregate = &file_named(&files, AGGREGATE_FILE_NAME).contents;
    assert!(aggregate.contains("find_package(spdlog 1.13.0 EXACT CONFIG REQUIRED)"), "{}", aggregate);
    assert!(!aggregate.contains("find_package(fmt"), "{}", aggregate);
  }

  #[test]
  fn non_numeric_versions_never_reach_a_version_slot() {
    let index_dir = index_with(&[
      ("pistache", "cmake_file_name: Pistache\nversions:\n  cci.20240107:\n    revisions: [aa11]\n    requires: [rapidjson/cci.20230929]\n"),
      ("rapidjson", "package_type: header-library\ncmake_file_name: RapidJSON\nversions:\n  cci.20230929:\n    revisions: [dd44]\n")
    ]);
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = LocalPackageCache::new(cache_dir.path());
    let recipe = ManifestRecipe::from_yaml_str("settings: [build_type]\nrequires: [pistache/cci.20240107]\n", "dated").unwrap();

    let mut settings = crate::recipe::Settings::new();
    settings.set_from_str("build_type", "Release").unwrap();

    let graph = resolve_graph(&recipe, &settings, &OptionSet::new(), &mut PackageIndex::new(index_dir.path())).unwrap();
    let installed = execute_plan(&graph, plan_binaries(&graph, BuildPolicy::Missing, &cache).unwrap(), &cache).unwrap();
    let files = render_cmake_deps(&GeneratorInput { graph: &graph, installed: &installed }).unwrap();

    for file in &files {
      for line in file.contents.lines().filter(|line| line.starts_with("find_package(") || line.starts_with("find_dependency(")) {
        assert!(!line.contains("cci."), "{}: {}", file.file_name, line);
        assert!(!line.contains("EXACT"), "{}: {}", file.file_name, line);
      }
    }

    assert!(file_named(&files, "Pistache-config.cmake").contents.contains("find_dependency(RapidJSON CONFIG)"));
    assert!(file_named(&files, AGGREGATE_FILE_NAME).contents.contains("find_package(Pistache CONFIG REQUIRED)"));
  }

  #[test]
  fn only_numeric_versions_are_passed_as_exact() {
    assert_eq!(exact_version_args("1.13.0"), " 1.13.0 EXACT");
    assert_eq!(exact_version_args("10"), " 10 EXACT");
    assert_eq!(exact_version_args("1.2.3.4"), " 1.2.3.4 EXACT");
    assert_eq!(exact_version_args("1.2.3.4.5"), "");
    assert_eq!(exact_version_args("cci.20230929"), "");
    assert_eq!(exact_version_args("2.4.2-rc1"), "");
  }
}
