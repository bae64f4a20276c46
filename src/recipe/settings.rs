use std::{collections::BTreeMap, fmt};

use enum_iterator::{all, Sequence};
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence)]
#[serde(deny_unknown_fields)]
pub enum SettingsAxis {
  #[serde(rename = "os")]
  Os,
  #[serde(rename = "compiler")]
  Compiler,
  #[serde(rename = "build_type")]
  BuildType,
  #[serde(rename = "arch")]
  Arch
}

impl SettingsAxis {
  pub fn name_string(&self) -> &'static str {
    match self {
      Self::Os => "os",
      Self::Compiler => "compiler",
      Self::BuildType => "build_type",
      Self::Arch => "arch"
    }
  }

  pub fn allowed_value_names(&self) -> Vec<&'static str> {
    match self {
      Self::Os => value_names::<TargetOs>(),
      Self::Compiler => value_names::<CompilerKind>(),
      Self::BuildType => value_names::<BuildType>(),
      Self::Arch => value_names::<TargetArch>()
    }
  }
}

/// Everything which can be given a value in a profile or on the command line.
/// `compiler.version` is a sub-setting of the compiler axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence)]
pub enum SettingKey {
  Os,
  Compiler,
  CompilerVersion,
  BuildType,
  Arch
}

impl SettingKey {
  pub fn from_str(key_str: &str) -> Option<Self> {
    let key: Self = match key_str {
      "os" => Self::Os,
      "compiler" => Self::Compiler,
      "compiler.version" => Self::CompilerVersion,
      "build_type" => Self::BuildType,
      "arch" => Self::Arch,
      _ => return None
    };

    return Some(key);
  }

  pub fn name_string(&self) -> &'static str {
    match self {
      Self::Os => "os",
      Self::Compiler => "compiler",
      Self::CompilerVersion => "compiler.version",
      Self::BuildType => "build_type",
      Self::Arch => "arch"
    }
  }

  // Sub-settings may stay unset even when their axis is fully resolved.
  pub fn is_optional(&self) -> bool {
    matches!(self, Self::CompilerVersion)
  }

  pub fn axis(&self) -> SettingsAxis {
    match self {
      Self::Os => SettingsAxis::Os,
      Self::Compiler | Self::CompilerVersion => SettingsAxis::Compiler,
      Self::BuildType => SettingsAxis::BuildType,
      Self::Arch => SettingsAxis::Arch
    }
  }

  /*
    Returns the canonical spelling of the value, or None if the value is not
    valid for this key. compiler.version is free-form.
  */
  pub fn canonical_value(&self, value: &str) -> Option<String> {
    match self {
      Self::Os => parse_axis_value::<TargetOs>(value).map(|os| os.name_string().to_string()),
      Self::Compiler => parse_axis_value::<CompilerKind>(value).map(|compiler| compiler.name_string().to_string()),
      Self::BuildType => parse_axis_value::<BuildType>(value).map(|build_type| build_type.name_string().to_string()),
      Self::Arch => parse_axis_value::<TargetArch>(value).map(|arch| arch.name_string().to_string()),
      Self::CompilerVersion => {
        let trimmed: &str = value.trim();

        if trimmed.is_empty() || trimmed.contains(char::is_whitespace)
          { None }
          else { Some(trimmed.to_string()) }
      }
    }
  }
}

pub trait AxisValue: Sequence + Copy {
  fn name_string(&self) -> &'static str;
}

pub fn parse_axis_value<T: AxisValue>(value: &str) -> Option<T> {
  return all::<T>()
    .find(|candidate| candidate.name_string().eq_ignore_ascii_case(value.trim()));
}

fn value_names<T: AxisValue>() -> Vec<&'static str> {
  return all::<T>()
    .map(|value| value.name_string())
    .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence)]
pub enum TargetOs {
  Windows,
  Linux,
  MacOS,
  Android,
  FreeBSD
}

impl AxisValue for TargetOs {
  fn name_string(&self) -> &'static str {
    match self {
      Self::Windows => "Windows",
      Self::Linux => "Linux",
      Self::MacOS => "Macos",
      Self::Android => "Android",
      Self::FreeBSD => "FreeBSD"
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence)]
pub enum CompilerKind {
  GCC,
  Clang,
  AppleClang,
  MSVC
}

impl AxisValue for CompilerKind {
  fn name_string(&self) -> &'static str {
    match self {
      Self::GCC => "gcc",
      Self::Clang => "clang",
      Self::AppleClang => "apple-clang",
      Self::MSVC => "msvc"
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence)]
pub enum BuildType {
  Debug,
  Release,
  RelWithDebInfo,
  MinSizeRel
}

impl AxisValue for BuildType {
  fn name_string(&self) -> &'static str {
    match self {
      Self::Debug => "Debug",
      Self::Release => "Release",
      Self::RelWithDebInfo => "RelWithDebInfo",
      Self::MinSizeRel => "MinSizeRel"
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence)]
pub enum TargetArch {
  X86,
  X86_64,
  Armv7,
  Armv8
}

impl AxisValue for TargetArch {
  fn name_string(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Armv7 => "armv7",
      Self::Armv8 => "armv8"
    }
  }
}

/// Settings values for a single invocation. Any field may be unset until the
/// settings are checked against the axes a recipe declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Settings {
  pub os: Option<TargetOs>,
  pub compiler: Option<CompilerKind>,
  pub compiler_version: Option<String>,
  pub build_type: Option<BuildType>,
  pub arch: Option<TargetArch>
}

impl Settings {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_from_str(&mut self, key_str: &str, value: &str) -> Result<(), String> {
    let key: SettingKey = SettingKey::from_str(key_str.trim())
      .ok_or_else(|| format!(
        "'{}' is not a valid setting. Valid settings are: {}",
        key_str,
        all::<SettingKey>()
          .map(|key| key.name_string())
          .collect::<Vec<&str>>()
          .join(", ")
      ))?;

    let invalid_value = || format!(
      "'{}' is not a valid value for setting '{}'. Possible values: {}",
      value,
      key.name_string(),
      key.axis().allowed_value_names().join(", ")
    );

    match key {
      SettingKey::Os => self.os = Some(parse_axis_value(value).ok_or_else(invalid_value)?),
      SettingKey::Compiler => self.compiler = Some(parse_axis_value(value).ok_or_else(invalid_value)?),
      SettingKey::BuildType => self.build_type = Some(parse_axis_value(value).ok_or_else(invalid_value)?),
      SettingKey::Arch => self.arch = Some(parse_axis_value(value).ok_or_else(invalid_value)?),
      SettingKey::CompilerVersion => {
        self.compiler_version = Some(
          key.canonical_value(value)
            .ok_or_else(|| format!("'{}' is not a valid compiler.version", value))?
        );
      }
    }

    Ok(())
  }

  pub fn from_map(settings_map: &BTreeMap<String, String>) -> Result<Self, String> {
    let mut settings: Settings = Settings::new();

    for (key, value) in settings_map {
      settings.set_from_str(key, value)?;
    }

    return Ok(settings);
  }

  /// Values from `other` replace the values in `self`.
  pub fn overlay(&mut self, other: &Settings) {
    if other.os.is_some() { self.os = other.os; }
    if other.compiler.is_some() { self.compiler = other.compiler; }
    if other.compiler_version.is_some() { self.compiler_version = other.compiler_version.clone(); }
    if other.build_type.is_some() { self.build_type = other.build_type; }
    if other.arch.is_some() { self.arch = other.arch; }
  }

  pub fn value_of(&self, key: SettingKey) -> Option<String> {
    match key {
      SettingKey::Os => self.os.map(|os| os.name_string().to_string()),
      SettingKey::Compiler => self.compiler.map(|compiler| compiler.name_string().to_string()),
      SettingKey::CompilerVersion => self.compiler_version.clone(),
      SettingKey::BuildType => self.build_type.map(|build_type| build_type.name_string().to_string()),
      SettingKey::Arch => self.arch.map(|arch| arch.name_string().to_string())
    }
  }

  pub fn is_set(&self, axis: SettingsAxis) -> bool {
    match axis {
      SettingsAxis::Os => self.os.is_some(),
      SettingsAxis::Compiler => self.compiler.is_some(),
      SettingsAxis::BuildType => self.build_type.is_some(),
      SettingsAxis::Arch => self.arch.is_some()
    }
  }

  pub fn missing_axes(&self, axes: &[SettingsAxis]) -> Vec<SettingsAxis> {
    return axes.iter()
      .copied()
      .filter(|axis| !self.is_set(*axis))
      .collect();
  }

  pub fn require_axes(&self, axes: &[SettingsAxis]) -> Result<(), String> {
    let missing: Vec<SettingsAxis> = self.missing_axes(axes);

    if missing.is_empty() {
      return Ok(());
    }

    return Err(format!(
      "The settings {} must be given a value before requirements can be resolved. Set them in a profile or with '-s <setting>=<value>'.",
      missing.iter()
        .map(|axis| format!("'{}'", axis.name_string()))
        .collect::<Vec<String>>()
        .join(", ")
    ));
  }

  /*
    Ordered (key, value) pairs for the given axes. This is the input which
    identifies a binary, so the ordering must never depend on anything other
    than the axis order.
  */
  pub fn canonical_entries(&self, axes: &[SettingsAxis]) -> Vec<(&'static str, String)> {
    let mut sorted_axes: Vec<SettingsAxis> = axes.to_vec();
    sorted_axes.sort();
    sorted_axes.dedup();

    let mut entries: Vec<(&'static str, String)> = Vec::new();

    for key in all::<SettingKey>() {
      if !sorted_axes.contains(&key.axis()) {
        continue;
      }

      if let Some(value) = self.value_of(key) {
        entries.push((key.name_string(), value));
      }
    }

    return entries;
  }

  pub fn build_type_or_default(&self) -> BuildType {
    self.build_type.unwrap_or(BuildType::Release)
  }
}

impl fmt::Display for Settings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let entries: Vec<String> = self.canonical_entries(&all::<SettingsAxis>().collect::<Vec<_>>())
      .into_iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect();

    if entries.is_empty() {
      write!(f, "<no settings>")
    }
    else {
      write!(f, "{}", entries.join(", "))
    }
  }
}
