mod cli_config;
mod common;
mod file_writers;
mod logger;
mod package_cache;
mod package_index;
mod program_actions;
mod recipe;
mod resolver;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use clap::Parser;
use cli_config::{
  clap_cli_config::{InstallCommand, Opts, RequirementsCommand, SubCommandStruct},
  load_settings_args,
  parse_option_assignments
};
use logger::exit_error_log;
use program_actions::{
  default_cache_dir,
  default_index_dir,
  info_printers::{print_manifest_summary, print_recipe_header, print_requirements, print_settings_axes},
  install_manifest,
  InstallConfig,
  InstallSummary
};
use recipe::{ManifestRecipe, Profile};
use resolver::declared_requirements;

fn main() {
  let Opts { manifest, subcommand } = Opts::parse();

  match subcommand {
    SubCommandStruct::Install(command) => do_install(&manifest, command),
    SubCommandStruct::Requirements(command) => do_print_requirements(&manifest, command),
    SubCommandStruct::Settings => print_settings_axes(),
    SubCommandStruct::Check => {
      let recipe: ManifestRecipe = load_manifest_or_exit(&manifest);
      print_manifest_summary(&recipe);
      logger::success(format!("'{}' is a valid dependency manifest.", manifest));
    }
  }
}

fn load_manifest_or_exit(manifest_path: &str) -> ManifestRecipe {
  match ManifestRecipe::load(manifest_path) {
    Ok(recipe) => recipe,
    Err(err_message) => exit_error_log(format!("Configuration error: {}", err_message))
  }
}

fn dir_or_default(
  given_dir: Option<String>,
  default_dir: fn() -> Result<PathBuf, String>
) -> PathBuf {
  match given_dir {
    Some(dir) => PathBuf::from(dir),
    None => default_dir().unwrap_or_else(|err_message| exit_error_log(err_message))
  }
}

fn do_install(manifest_path: &str, command: InstallCommand) {
  let InstallCommand {
    settings_args,
    options,
    index,
    cache,
    output_folder,
    build
  } = command;

  let Profile { settings, options: mut option_overrides } = load_settings_args(&settings_args)
    .unwrap_or_else(|err_message| exit_error_log(err_message));

  let command_line_options = parse_option_assignments(&options)
    .unwrap_or_else(|err_message| exit_error_log(err_message));

  option_overrides.overlay(&command_line_options);

  let config = InstallConfig {
    settings,
    option_overrides,
    index_dir: dir_or_default(index, default_index_dir),
    cache_dir: dir_or_default(cache, default_cache_dir),
    output_folder: PathBuf::from(output_folder),
    build_policy: build.map(Into::into)
  };

  match install_manifest(manifest_path, &config) {
    Ok(summary) => print_install_summary(&summary, &config),
    Err(failure_reason) => exit_error_log(failure_reason.to_string())
  }
}

fn print_install_summary(summary: &InstallSummary, config: &InstallConfig) {
  logger::info(format!("\nPackages of '{}':", summary.recipe_name));

  for item in &summary.packages {
    logger::info(format!(
      "\t{} - {} ({})",
      item.reference,
      item.package_id,
      item.action.name_string()
    ));
  }

  logger::success(format!(
    "Installed {} packages. Wrote {} files to '{}'",
    summary.packages.len(),
    summary.written_files.len(),
    config.output_folder.to_string_lossy()
  ));
}

fn do_print_requirements(manifest_path: &str, command: RequirementsCommand) {
  let recipe: ManifestRecipe = load_manifest_or_exit(manifest_path);

  let profile: Profile = load_settings_args(&command.settings_args)
    .unwrap_or_else(|err_message| exit_error_log(err_message));

  match declared_requirements(&recipe, &profile.settings, &profile.options) {
    Ok((registry, _)) => {
      print_recipe_header(&recipe);
      print_requirements(&registry, &profile.settings);
    },
    Err(failure_reason) => exit_error_log(failure_reason.to_string())
  }
}
