use std::{collections::BTreeMap, path::PathBuf};

use crate::{
  logger,
  package_cache::{BinaryOrigin, CachedBinaryRecord, LocalPackageCache},
  package_index::PrebuiltBinary,
  recipe::BuildPolicy
};

use super::{
  package_id::{compute_package_id, settings_entries_for},
  ResolveFailureReason,
  ResolvedGraph,
  ResolvedPackage
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryAction {
  UseCached,
  Download,
  Build
}

impl BinaryAction {
  pub fn name_string(&self) -> &'static str {
    match self {
      Self::UseCached => "Cache",
      Self::Download => "Download",
      Self::Build => "Build"
    }
  }
}

#[derive(Debug, Clone)]
pub struct PlannedBinary<'a> {
  pub package: &'a ResolvedPackage,
  pub action: BinaryAction
}

#[derive(Debug, Clone)]
pub struct InstalledPackage<'a> {
  pub package: &'a ResolvedPackage,
  pub action: BinaryAction,
  pub folder: PathBuf
}

/*
  Decides how every package in the graph gets its binary. Nothing is written
  here, so a failing plan leaves the cache exactly as it was.
*/
pub fn plan_binaries<'a>(
  graph: &'a ResolvedGraph,
  policy: BuildPolicy,
  cache: &LocalPackageCache
) -> Result<Vec<PlannedBinary<'a>>, ResolveFailureReason> {
  let mut planned: Vec<PlannedBinary> = Vec::new();
  let mut missing_binaries: Vec<String> = Vec::new();

  for package in &graph.packages {
    let action: BinaryAction = if policy == BuildPolicy::Always {
      BinaryAction::Build
    }
    else if is_in_cache(package, cache)? {
      BinaryAction::UseCached
    }
    else if has_matching_prebuilt_binary(graph, package)? {
      BinaryAction::Download
    }
    else if policy == BuildPolicy::Missing {
      BinaryAction::Build
    }
    else {
      missing_binaries.push(format!(
        "'{}' (package id {}) for [{}]",
        package.reference,
        package.package_id,
        graph.settings
      ));
      continue;
    };

    planned.push(PlannedBinary { package, action });
  }

  if !missing_binaries.is_empty() {
    return Err(ResolveFailureReason::Resolution(format!(
      "Missing prebuilt package for {}. Use '--build missing' to build {} from source.",
      missing_binaries.join(", "),
      if missing_binaries.len() == 1 { "it" } else { "them" }
    )));
  }

  for planned_binary in &planned {
    if planned_binary.action == BinaryAction::Build {
      check_source_build_allowed(graph, planned_binary.package)?;
    }
  }

  return Ok(planned);
}

fn is_in_cache(package: &ResolvedPackage, cache: &LocalPackageCache) -> Result<bool, ResolveFailureReason> {
  let maybe_record: Option<CachedBinaryRecord> = cache.read_record(package.name(), package.version(), &package.package_id)
    .map_err(ResolveFailureReason::Io)?;

  return Ok(maybe_record.map_or(false, |record| record.package_id == package.package_id));
}

fn has_matching_prebuilt_binary(graph: &ResolvedGraph, package: &ResolvedPackage) -> Result<bool, ResolveFailureReason> {
  for binary in &package.version_info.binaries {
    if prebuilt_binary_id(graph, package, binary)? == package.package_id {
      return Ok(true);
    }
  }

  return Ok(false);
}

fn prebuilt_binary_id(
  graph: &ResolvedGraph,
  package: &ResolvedPackage,
  binary: &PrebuiltBinary
) -> Result<String, ResolveFailureReason> {
  let binary_options: BTreeMap<String, String> = package.descriptor
    .effective_options(Some(&binary.options))
    .map_err(|err_message| ResolveFailureReason::Configuration(format!(
      "A prebuilt binary of '{}' in the package index is invalid: {}",
      package.reference,
      err_message
    )))?;

  return Ok(compute_package_id(
    &package.reference,
    &settings_entries_for(package.package_type(), &binary.settings, &graph.settings_axes),
    &binary_options
  ));
}

fn check_source_build_allowed(graph: &ResolvedGraph, package: &ResolvedPackage) -> Result<(), ResolveFailureReason> {
  let source_build = match &package.version_info.source_build {
    None => return Ok(()),
    Some(condition) => condition
  };

  let can_build: bool = source_build.evaluate(&graph.settings)
    .map_err(|err_message| ResolveFailureReason::Build(format!(
      "Unable to tell whether '{}' can be built from source: {}",
      package.reference,
      err_message
    )))?;

  if can_build {
    return Ok(());
  }

  return Err(ResolveFailureReason::Build(format!(
    "'{}' can't be built from source for [{}]. Its source build requires {}.",
    package.reference,
    graph.settings,
    source_build
  )));
}

pub fn execute_plan<'a>(
  graph: &ResolvedGraph,
  planned: Vec<PlannedBinary<'a>>,
  cache: &LocalPackageCache
) -> Result<Vec<InstalledPackage<'a>>, ResolveFailureReason> {
  let mut installed: Vec<InstalledPackage> = Vec::new();

  for PlannedBinary { package, action } in planned {
    let folder: PathBuf = match action {
      BinaryAction::UseCached => cache.package_folder(package.name(), package.version(), &package.package_id),
      BinaryAction::Download | BinaryAction::Build => {
        let origin: BinaryOrigin = if action == BinaryAction::Build {
          logger::info(format!("Building '{}' from source ({})", package.reference, package.package_id));
          BinaryOrigin::Build
        }
        else {
          logger::info(format!("Retrieving prebuilt '{}' ({})", package.reference, package.package_id));
          BinaryOrigin::Download
        };

        store_in_cache(graph, package, origin, cache)?
      }
    };

    installed.push(InstalledPackage { package, action, folder });
  }

  return Ok(installed);
}

fn store_in_cache(
  graph: &ResolvedGraph,
  package: &ResolvedPackage,
  origin: BinaryOrigin,
  cache: &LocalPackageCache
) -> Result<PathBuf, ResolveFailureReason> {
  let record = CachedBinaryRecord {
    reference: package.reference.to_string(),
    package_id: package.package_id.clone(),
    origin,
    settings: graph.settings_entries_for(package.package_type())
      .into_iter()
      .map(|(key, value)| (key.to_string(), value))
      .collect(),
    options: package.options.clone()
  };

  let layout_dirs: Vec<String> = package.version_info.include_dirs
    .iter()
    .chain(package.version_info.lib_dirs.iter())
    .cloned()
    .collect();

  return cache.store(package.name(), package.version(), &record, &layout_dirs)
    .map_err(|err| ResolveFailureReason::Io(format!(
      "Unable to store '{}' in the package cache at '{}': {}",
      package.reference,
      cache.root().to_string_lossy(),
      err.to_string()
    )));
}
