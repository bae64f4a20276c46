mod failure_reason;
pub mod package_id;
pub mod binary_plan;

use std::{collections::{BTreeMap, VecDeque}, rc::Rc};

use crate::{
  logger,
  package_index::{PackageDescriptor, PackageIndex, PackageType, PackageVersionInfo},
  recipe::{OptionSet, Recipe, RequirementRef, RequirementRegistry, Settings, SettingsAxis}
};

pub use failure_reason::ResolveFailureReason;
use self::package_id::{compute_package_id, settings_entries_for};

#[derive(Debug, Clone)]
pub struct ResolvedPackage {
  // Always carries the revision which was resolved.
  pub reference: RequirementRef,
  pub is_direct: bool,
  pub required_by: Option<String>,
  pub options: BTreeMap<String, String>,
  pub package_id: String,
  pub dependency_names: Vec<String>,
  pub descriptor: Rc<PackageDescriptor>,
  pub version_info: PackageVersionInfo
}

impl ResolvedPackage {
  pub fn name(&self) -> &str {
    &self.reference.name
  }

  pub fn version(&self) -> &str {
    &self.reference.version
  }

  pub fn revision(&self) -> &str {
    self.reference.revision.as_deref().unwrap_or_default()
  }

  pub fn package_type(&self) -> PackageType {
    self.descriptor.package_type
  }
}

/// Packages in resolution order: direct requirements in the order the recipe
/// registered them, then transitive requirements in the order they were found.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
  pub recipe_name: String,
  pub settings: Settings,
  pub settings_axes: Vec<SettingsAxis>,
  pub packages: Vec<ResolvedPackage>
}

impl ResolvedGraph {
  pub fn find(&self, package_name: &str) -> Option<&ResolvedPackage> {
    self.packages.iter().find(|package| package.name() == package_name)
  }

  pub fn direct_packages(&self) -> impl Iterator<Item=&ResolvedPackage> {
    self.packages.iter().filter(|package| package.is_direct)
  }

  pub fn settings_entries_for(&self, package_type: PackageType) -> Vec<(&'static str, String)> {
    settings_entries_for(package_type, &self.settings, &self.settings_axes)
  }
}

/// Runs the recipe's hooks, then returns just the requirements it registers.
/// Nothing is looked up in the package index.
pub fn declared_requirements(
  recipe: &dyn Recipe,
  settings: &Settings,
  option_overrides: &OptionSet
) -> Result<(RequirementRegistry, OptionSet), ResolveFailureReason> {
  let mut options: OptionSet = recipe.default_options();
  options.overlay(option_overrides);

  recipe.config_options(&mut options, settings)
    .map_err(|err_message| ResolveFailureReason::Configuration(format!(
      "In config_options of '{}': {}",
      recipe.name(),
      err_message
    )))?;

  settings.require_axes(recipe.settings_axes())
    .map_err(ResolveFailureReason::Configuration)?;

  let mut registry: RequirementRegistry = RequirementRegistry::new();

  recipe.requirements(settings, &mut registry)
    .map_err(|err_message| ResolveFailureReason::Configuration(format!(
      "In requirements of '{}': {}",
      recipe.name(),
      err_message
    )))?;

  return Ok((registry, options));
}

struct PendingRequirement {
  reference: RequirementRef,
  required_by: Option<String>
}

pub fn resolve_graph(
  recipe: &dyn Recipe,
  settings: &Settings,
  option_overrides: &OptionSet,
  index: &mut PackageIndex
) -> Result<ResolvedGraph, ResolveFailureReason> {
  let (registry, options) = declared_requirements(recipe, settings, option_overrides)?;

  index.ensure_exists()?;

  let mut pending: VecDeque<PendingRequirement> = registry.into_requirements()
    .into_iter()
    .map(|reference| PendingRequirement { reference, required_by: None })
    .collect();

  let mut packages: Vec<ResolvedPackage> = Vec::new();

  while let Some(PendingRequirement { reference, required_by }) = pending.pop_front() {
    if let Some(existing) = packages.iter().find(|package| package.name() == reference.name) {
      check_compatible_with_existing(existing, &reference, required_by.as_deref())?;
      continue;
    }

    let resolved: ResolvedPackage = resolve_single_requirement(index, reference, required_by)?;

    for transitive_reference in &resolved.version_info.requires {
      pending.push_back(PendingRequirement {
        reference: transitive_reference.clone(),
        required_by: Some(resolved.name().to_string())
      });
    }

    packages.push(resolved);
  }

  for scoped_package_name in options.packages() {
    if !packages.iter().any(|package| package.name() == scoped_package_name) {
      logger::warn(format!(
        "Options were given for '{}', which is not in the dependency graph. They are ignored.",
        scoped_package_name
      ));
    }
  }

  for package in &mut packages {
    package.options = package.descriptor
      .effective_options(options.package_options(package.name()))
      .map_err(ResolveFailureReason::Configuration)?;

    package.package_id = compute_package_id(
      &package.reference,
      &settings_entries_for(package.package_type(), settings, recipe.settings_axes()),
      &package.options
    );
  }

  return Ok(ResolvedGraph {
    recipe_name: recipe.name().to_string(),
    settings: settings.clone(),
    settings_axes: recipe.settings_axes().to_vec(),
    packages
  });
}

fn requirer_description(required_by: Option<&str>) -> String {
  match required_by {
    Some(requirer) => format!("'{}'", requirer),
    None => String::from("the recipe")
  }
}

fn check_compatible_with_existing(
  existing: &ResolvedPackage,
  reference: &RequirementRef,
  required_by: Option<&str>
) -> Result<(), ResolveFailureReason> {
  let same_version: bool = existing.version() == reference.version;
  let same_revision: bool = reference.revision
    .as_deref()
    .map_or(true, |revision| revision == existing.revision());

  if same_version && same_revision {
    return Ok(());
  }

  return Err(ResolveFailureReason::Resolution(format!(
    "Version conflict: {} requires '{}', but '{}' was already resolved (required by {}).",
    requirer_description(required_by),
    reference,
    existing.reference,
    requirer_description(existing.required_by.as_deref())
  )));
}

fn resolve_single_requirement(
  index: &mut PackageIndex,
  reference: RequirementRef,
  required_by: Option<String>
) -> Result<ResolvedPackage, ResolveFailureReason> {
  let descriptor: Rc<PackageDescriptor> = index.find_package(&reference.name)?
    .ok_or_else(|| ResolveFailureReason::Resolution(format!(
      "Package '{}' (required by {}) was not found in the package index at '{}'.",
      reference,
      requirer_description(required_by.as_deref()),
      index.root().to_string_lossy()
    )))?;

  let version_info: PackageVersionInfo = descriptor.version(&reference.version)
    .cloned()
    .ok_or_else(|| ResolveFailureReason::Resolution(format!(
      "Version '{}' of package '{}' (required by {}) was not found. Available versions: [{}]",
      reference.version,
      reference.name,
      requirer_description(required_by.as_deref()),
      descriptor.available_versions().join(", ")
    )))?;

  let revision: String = match &reference.revision {
    Some(pinned_revision) => {
      if !version_info.has_revision(pinned_revision) {
        return Err(ResolveFailureReason::Resolution(format!(
          "Revision '{}' of '{}' was not found. Available revisions: [{}]",
          pinned_revision,
          reference.without_revision(),
          version_info.revisions.join(", ")
        )));
      }
      pinned_revision.clone()
    },
    None => version_info.latest_revision().to_string()
  };

  let dependency_names: Vec<String> = version_info.requires
    .iter()
    .map(|dependency| dependency.name.clone())
    .collect();

  return Ok(ResolvedPackage {
    reference: reference.with_revision(&revision),
    is_direct: required_by.is_none(),
    required_by,
    options: BTreeMap::new(),
    package_id: String::new(),
    dependency_names,
    descriptor,
    version_info
  });
}
