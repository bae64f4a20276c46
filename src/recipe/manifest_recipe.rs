use std::{fs, path::Path};

use super::{
  BuildPolicy,
  GeneratorKind,
  OptionPath,
  OptionSet,
  Recipe,
  RequirementRef,
  RequirementRegistry,
  Settings,
  SettingsAxis,
  parsers::{SettingsConditionTree, parse_condition_with_diagnostic},
  raw_recipe_in::{RawOptionRule, RawRecipe, RawRequirementIn}
};

pub const DEFAULT_MANIFEST_FILE_NAME: &'static str = "deps.yaml";

#[derive(Debug, Clone)]
pub struct ConditionalRequirement {
  pub reference: RequirementRef,
  pub condition: Option<SettingsConditionTree>
}

impl ConditionalRequirement {
  pub fn applies_to(&self, settings: &Settings) -> Result<bool, String> {
    match &self.condition {
      None => Ok(true),
      Some(condition) => condition.evaluate(settings)
        .map_err(|err_message| format!("In the condition for requirement '{}': {}", self.reference, err_message))
    }
  }
}

#[derive(Debug, Clone)]
pub struct OptionRule {
  pub condition: Option<SettingsConditionTree>,
  pub set: Vec<(OptionPath, String)>,
  pub remove: Vec<OptionPath>
}

/// A recipe loaded from a YAML manifest file.
#[derive(Debug, Clone)]
pub struct ManifestRecipe {
  name: String,
  build_policy: BuildPolicy,
  settings_axes: Vec<SettingsAxis>,
  generators: Vec<GeneratorKind>,
  requirements: Vec<ConditionalRequirement>,
  options: OptionSet,
  option_rules: Vec<OptionRule>
}

impl ManifestRecipe {
  pub fn load(manifest_path: impl AsRef<Path>) -> Result<Self, String> {
    let manifest_path: &Path = manifest_path.as_ref();

    if !manifest_path.is_file() {
      return Err(format!(
        "Dependency manifest '{}' does not exist.",
        manifest_path.to_string_lossy()
      ));
    }

    let contents: String = fs::read_to_string(manifest_path)
      .map_err(|err| format!(
        "Unable to read dependency manifest '{}': {}",
        manifest_path.to_string_lossy(),
        err.to_string()
      ))?;

    // Unnamed manifests take the name of the directory they live in.
    let fallback_name: String = manifest_path
      .canonicalize()
      .ok()
      .and_then(|full_path| full_path.parent().and_then(|parent| parent.file_name()).map(|name| name.to_string_lossy().to_string()))
      .unwrap_or_else(|| String::from("recipe"));

    return Self::from_yaml_str(&contents, &fallback_name)
      .map_err(|err_message| format!(
        "In dependency manifest '{}':\n{}",
        manifest_path.to_string_lossy(),
        err_message
      ));
  }

  pub fn from_yaml_str(contents: &str, fallback_name: &str) -> Result<Self, String> {
    let raw_recipe: RawRecipe = serde_yaml::from_str(contents)
      .map_err(|err| format!("Invalid manifest: {}", err.to_string()))?;

    return Self::from_raw(raw_recipe, fallback_name);
  }

  pub fn from_raw(raw_recipe: RawRecipe, fallback_name: &str) -> Result<Self, String> {
    let RawRecipe {
      name,
      build_policy,
      settings,
      generators,
      requires,
      options: raw_options,
      config_options
    } = raw_recipe;

    let settings_axes: Vec<SettingsAxis> = validated_settings_axes(settings)?;

    let mut unique_generators: Vec<GeneratorKind> = Vec::new();

    for generator in generators {
      if unique_generators.contains(&generator) {
        return Err(format!("Generator '{}' is listed more than once.", generator.name_string()));
      }
      unique_generators.push(generator);
    }

    let mut requirements: Vec<ConditionalRequirement> = Vec::new();

    for raw_requirement in requires {
      let (reference_str, maybe_condition) = match raw_requirement {
        RawRequirementIn::Plain(reference_str) => (reference_str, None),
        RawRequirementIn::Conditional(conditional) => (conditional.reference, conditional.when)
      };

      let reference: RequirementRef = RequirementRef::parse(&reference_str)?;

      let condition: Option<SettingsConditionTree> = match maybe_condition {
        None => None,
        Some(condition_str) => Some(
          parse_declared_condition(&condition_str, &settings_axes)
            .map_err(|err_message| format!("In the 'when' condition of requirement '{}': {}", reference, err_message))?
        )
      };

      requirements.push(ConditionalRequirement { reference, condition });
    }

    let mut options: OptionSet = OptionSet::new();

    for (package_name, package_options) in raw_options.unwrap_or_default() {
      for (key, value) in package_options {
        options.set(&OptionPath::new(&package_name, &key)?, value.to_option_string());
      }
    }

    let mut option_rules: Vec<OptionRule> = Vec::new();

    for (rule_index, raw_rule) in config_options.unwrap_or_default().into_iter().enumerate() {
      option_rules.push(
        validated_option_rule(raw_rule, &settings_axes)
          .map_err(|err_message| format!("In config_options rule #{}: {}", rule_index + 1, err_message))?
      );
    }

    return Ok(Self {
      name: name.unwrap_or_else(|| fallback_name.to_string()),
      build_policy,
      settings_axes,
      generators: unique_generators,
      requirements,
      options,
      option_rules
    });
  }

  pub fn declared_requirements(&self) -> &[ConditionalRequirement] {
    &self.requirements
  }

  pub fn option_rules(&self) -> &[OptionRule] {
    &self.option_rules
  }
}

impl Recipe for ManifestRecipe {
  fn name(&self) -> &str {
    &self.name
  }

  fn settings_axes(&self) -> &[SettingsAxis] {
    &self.settings_axes
  }

  fn generators(&self) -> &[GeneratorKind] {
    &self.generators
  }

  fn build_policy(&self) -> BuildPolicy {
    self.build_policy
  }

  fn default_options(&self) -> OptionSet {
    self.options.clone()
  }

  fn config_options(&self, options: &mut OptionSet, settings: &Settings) -> Result<(), String> {
    for (rule_index, rule) in self.option_rules.iter().enumerate() {
      let rule_applies: bool = match &rule.condition {
        None => true,
        Some(condition) => condition.evaluate(settings)
          .map_err(|err_message| format!("In config_options rule #{}: {}", rule_index + 1, err_message))?
      };

      if !rule_applies {
        continue;
      }

      for option_path in &rule.remove {
        options.remove(option_path);
      }

      for (option_path, value) in &rule.set {
        options.set(option_path, value.clone());
      }
    }

    Ok(())
  }

  fn requirements(&self, settings: &Settings, registry: &mut RequirementRegistry) -> Result<(), String> {
    for requirement in &self.requirements {
      if requirement.applies_to(settings)? {
        registry.requires(requirement.reference.clone())?;
      }
    }

    Ok(())
  }
}

fn validated_settings_axes(given_axes: Vec<SettingsAxis>) -> Result<Vec<SettingsAxis>, String> {
  let mut settings_axes: Vec<SettingsAxis> = Vec::new();

  for axis in given_axes {
    if settings_axes.contains(&axis) {
      return Err(format!("Settings axis '{}' is listed more than once.", axis.name_string()));
    }
    settings_axes.push(axis);
  }

  return Ok(settings_axes);
}

/*
  A condition may only refer to axes the manifest declares. Anything else
  would make the recipe's identity depend on a setting it never declared.
*/
fn parse_declared_condition(
  condition_str: &str,
  settings_axes: &[SettingsAxis]
) -> Result<SettingsConditionTree, String> {
  let condition: SettingsConditionTree = parse_condition_with_diagnostic(condition_str)?;

  let undeclared_axes: Vec<&str> = condition.referenced_axes()
    .into_iter()
    .filter(|axis| !settings_axes.contains(axis))
    .map(|axis| axis.name_string())
    .collect();

  if !undeclared_axes.is_empty() {
    return Err(format!(
      "Condition '{}' references the settings axes [{}], which are not declared in the manifest's 'settings' list.",
      condition_str,
      undeclared_axes.join(", ")
    ));
  }

  return Ok(condition);
}

fn validated_option_rule(
  raw_rule: RawOptionRule,
  settings_axes: &[SettingsAxis]
) -> Result<OptionRule, String> {
  let condition: Option<SettingsConditionTree> = match &raw_rule.when {
    None => None,
    Some(condition_str) => Some(parse_declared_condition(condition_str, settings_axes)?)
  };

  let mut set: Vec<(OptionPath, String)> = Vec::new();

  for (path_str, value) in raw_rule.set.unwrap_or_default() {
    set.push((OptionPath::parse(&path_str)?, value.to_option_string()));
  }

  let mut remove: Vec<OptionPath> = Vec::new();

  for path_str in raw_rule.remove.unwrap_or_default() {
    remove.push(OptionPath::parse(&path_str)?);
  }

  if set.is_empty() && remove.is_empty() {
    return Err(String::from("The rule neither sets nor removes any option."));
  }

  return Ok(OptionRule { condition, set, remove });
}
