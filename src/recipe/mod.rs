pub mod parsers;
pub mod settings;
pub mod options;
pub mod requirement_ref;
pub mod raw_recipe_in;
pub mod profile;
mod manifest_recipe;

pub use manifest_recipe::*;
pub use options::{OptionSet, OptionPath};
pub use profile::Profile;
pub use raw_recipe_in::{BuildPolicy, GeneratorKind};
pub use requirement_ref::RequirementRef;
pub use settings::{Settings, SettingsAxis};

/// The requirements a recipe registers for one set of settings, in the order
/// they were registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementRegistry {
  requirements: Vec<RequirementRef>
}

impl RequirementRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn requires(&mut self, reference: RequirementRef) -> Result<(), String> {
    if let Some(existing) = self.requirements.iter().find(|existing| existing.name == reference.name) {
      return Err(format!(
        "Duplicated requirement '{}': '{}' is already required.",
        reference,
        existing
      ));
    }

    self.requirements.push(reference);
    Ok(())
  }

  pub fn requirements(&self) -> &[RequirementRef] {
    &self.requirements
  }

  pub fn len(&self) -> usize {
    self.requirements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.requirements.is_empty()
  }

  pub fn into_requirements(self) -> Vec<RequirementRef> {
    self.requirements
  }
}

/*
  The contract between a buildable unit and the resolver.

  `config_options` only receives the option set, so it has no way to register a
  requirement. It runs before the settings are checked for completeness.
  `requirements` runs once all declared settings axes have values, and must
  register the same requirements every time it is given the same settings.
*/
pub trait Recipe {
  fn name(&self) -> &str;
  fn settings_axes(&self) -> &[SettingsAxis];
  fn generators(&self) -> &[GeneratorKind];
  fn build_policy(&self) -> BuildPolicy;

  fn default_options(&self) -> OptionSet {
    OptionSet::new()
  }

  fn config_options(&self, _options: &mut OptionSet, _settings: &Settings) -> Result<(), String> {
    Ok(())
  }

  fn requirements(&self, settings: &Settings, registry: &mut RequirementRegistry) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registry_rejects_duplicate_package_names() {
    let mut registry = RequirementRegistry::new();
    registry.requires(RequirementRef::new("spdlog", "1.13.0")).unwrap();

    let message = registry.requires(RequirementRef::new("spdlog", "1.12.0")).unwrap_err();
    assert!(message.contains("Duplicated requirement 'spdlog/1.12.0'"), "{}", message);
    assert_eq!(registry.len(), 1);
  }
}
