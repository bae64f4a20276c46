use std::path::{Path, PathBuf};

use crate::{
  file_writers::{render_generators, write_generated_files, GeneratedFile, GeneratorInput},
  logger,
  package_cache::LocalPackageCache,
  package_index::PackageIndex,
  recipe::{BuildPolicy, ManifestRecipe, OptionSet, Recipe, Settings},
  resolver::{
    binary_plan::{execute_plan, plan_binaries, BinaryAction, InstalledPackage},
    resolve_graph,
    ResolveFailureReason,
    ResolvedGraph
  }
};

pub struct InstallConfig {
  pub settings: Settings,
  pub option_overrides: OptionSet,
  pub index_dir: PathBuf,
  pub cache_dir: PathBuf,
  pub output_folder: PathBuf,
  // Replaces the recipe's own policy when given.
  pub build_policy: Option<BuildPolicy>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledSummaryItem {
  pub reference: String,
  pub package_id: String,
  pub action: BinaryAction,
  pub folder: PathBuf
}

#[derive(Debug, Clone)]
pub struct InstallSummary {
  pub recipe_name: String,
  pub packages: Vec<InstalledSummaryItem>,
  pub written_files: Vec<PathBuf>
}

pub fn install_manifest(
  manifest_path: impl AsRef<Path>,
  config: &InstallConfig
) -> Result<InstallSummary, ResolveFailureReason> {
  let manifest_path: &Path = manifest_path.as_ref();

  let recipe: ManifestRecipe = ManifestRecipe::load(manifest_path)
    .map_err(ResolveFailureReason::Configuration)?;

  return install_recipe(&recipe, config)
    .map_err(|failure_reason| failure_reason.map_message(|err_message| format!(
      "While installing the dependencies of '{}':\n{}",
      manifest_path.to_string_lossy(),
      err_message
    )));
}

/*
  Every check that can fail happens before the first side effect. Binaries
  land in the cache before any generator file is written, so a failing build
  never leaves integration files behind.
*/
pub fn install_recipe(
  recipe: &dyn Recipe,
  config: &InstallConfig
) -> Result<InstallSummary, ResolveFailureReason> {
  let mut index: PackageIndex = PackageIndex::new(&config.index_dir);
  let cache: LocalPackageCache = LocalPackageCache::new(&config.cache_dir);
  let build_policy: BuildPolicy = config.build_policy.unwrap_or(recipe.build_policy());

  logger::info(format!(
    "Resolving dependencies of '{}' for [{}] (build policy: {})",
    recipe.name(),
    config.settings,
    build_policy.name_string()
  ));

  let graph: ResolvedGraph = resolve_graph(recipe, &config.settings, &config.option_overrides, &mut index)?;

  let planned = plan_binaries(&graph, build_policy, &cache)?;
  let installed: Vec<InstalledPackage> = execute_plan(&graph, planned, &cache)?;

  let generated_files: Vec<GeneratedFile> = render_generators(
    recipe.generators(),
    &GeneratorInput { graph: &graph, installed: &installed },
    |generator| logger::info(format!("Generating {} files", generator.name_string())),
    |_, _| {}
  )?;

  let written_files: Vec<PathBuf> = if generated_files.is_empty() {
    Vec::new()
  }
  else {
    write_generated_files(&config.output_folder, &generated_files)?
  };

  let packages: Vec<InstalledSummaryItem> = installed
    .iter()
    .map(|installed_package| InstalledSummaryItem {
      reference: installed_package.package.reference.to_string(),
      package_id: installed_package.package.package_id.clone(),
      action: installed_package.action,
      folder: installed_package.folder.clone()
    })
    .collect();

  return Ok(InstallSummary {
    recipe_name: recipe.name().to_string(),
    packages,
    written_files
  });
}
