use colored::*;
use enum_iterator::all;

use crate::recipe::{ManifestRecipe, Recipe, RequirementRegistry, Settings, SettingsAxis};

pub fn print_recipe_header(recipe: &dyn Recipe) {
  println!("\n========== {} ==========", recipe.name().green());
}

pub fn print_requirements(registry: &RequirementRegistry, settings: &Settings) {
  println!("Requirements for [{}]:", settings);

  if registry.is_empty() {
    println!("\tNone");
    return;
  }

  for reference in registry.requirements() {
    println!("\t- {}", reference);
  }
}

pub fn print_settings_axes() {
  for axis in all::<SettingsAxis>() {
    println!("{}: {}", axis.name_string().green(), axis.allowed_value_names().join(", "));
  }

  println!("{}: any version string (sub-setting of compiler)", "compiler.version".green());
}

pub fn print_manifest_summary(recipe: &ManifestRecipe) {
  print_recipe_header(recipe);

  println!("Build policy: {}", recipe.build_policy().name_string());

  println!(
    "Settings axes: [{}]",
    recipe.settings_axes()
      .iter()
      .map(|axis| axis.name_string())
      .collect::<Vec<&str>>()
      .join(", ")
  );

  println!(
    "Generators: [{}]",
    recipe.generators()
      .iter()
      .map(|generator| generator.name_string())
      .collect::<Vec<&str>>()
      .join(", ")
  );

  println!("Declared requirements:");

  for requirement in recipe.declared_requirements() {
    match &requirement.condition {
      Some(condition) => println!("\t- {} when {}", requirement.reference, condition),
      None => println!("\t- {}", requirement.reference)
    }
  }

  if !recipe.option_rules().is_empty() {
    println!("Option rules: {}", recipe.option_rules().len());
  }
}
