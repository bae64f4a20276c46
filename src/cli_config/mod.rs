pub mod clap_cli_config;

use crate::recipe::{options::parse_option_assignment, BuildPolicy, OptionSet, Profile, Settings};

use self::clap_cli_config::{CLIBuildPolicyIn, SettingsArgs};

impl From<CLIBuildPolicyIn> for BuildPolicy {
  fn from(policy: CLIBuildPolicyIn) -> Self {
    match policy {
      CLIBuildPolicyIn::Never => BuildPolicy::Never,
      CLIBuildPolicyIn::Missing => BuildPolicy::Missing,
      CLIBuildPolicyIn::Always => BuildPolicy::Always
    }
  }
}

/// Settings and options from the profile (if given), with each `-s`
/// assignment applied on top.
pub fn load_settings_args(settings_args: &SettingsArgs) -> Result<Profile, String> {
  let mut profile: Profile = match &settings_args.profile {
    Some(profile_path) => Profile::load(profile_path)?,
    None => Profile::default()
  };

  profile.settings.overlay(&parse_setting_assignments(&settings_args.settings)?);
  return Ok(profile);
}

pub fn parse_setting_assignments(assignments: &[String]) -> Result<Settings, String> {
  let mut settings: Settings = Settings::new();

  for assignment in assignments {
    let (key, value) = assignment.split_once('=')
      .ok_or_else(|| format!(
        "Setting '{}' must be written as '<axis>=<value>' (for example 'os=Linux').",
        assignment
      ))?;

    settings.set_from_str(key, value)?;
  }

  return Ok(settings);
}

pub fn parse_option_assignments(assignments: &[String]) -> Result<OptionSet, String> {
  let mut options: OptionSet = OptionSet::new();

  for assignment in assignments {
    let (option_path, value) = parse_option_assignment(assignment)?;
    options.set(&option_path, value);
  }

  return Ok(options);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::recipe::OptionPath;
  use clap::Parser;
  use super::clap_cli_config::{Opts, SubCommandStruct};

  #[test]
  fn command_line_settings_override_the_profile() {
    let profile_dir = tempfile::tempdir().unwrap();
    let profile_path = profile_dir.path().join("linux.yaml");
    std::fs::write(&profile_path, "settings:\n  os: Linux\n  build_type: Debug\n").unwrap();

    let profile = load_settings_args(&SettingsArgs {
      profile: Some(profile_path.to_string_lossy().to_string()),
      settings: vec![String::from("build_type=Release"), String::from("arch=x86_64")]
    }).unwrap();

    assert_eq!(profile.settings.to_string(), "os=Linux, build_type=Release, arch=x86_64");
  }

  #[test]
  fn malformed_assignments_are_rejected() {
    assert!(parse_setting_assignments(&[String::from("os")]).unwrap_err().contains("<axis>=<value>"));
    assert!(parse_setting_assignments(&[String::from("platform=Linux")]).is_err());
    assert!(parse_option_assignments(&[String::from("shared=True")]).is_err());

    let options = parse_option_assignments(&[String::from("spdlog:shared=True")]).unwrap();
    assert_eq!(options.get(&OptionPath::parse("spdlog:shared").unwrap()), Some("True"));
  }

  #[test]
  fn manifest_defaults_to_the_standard_file_name() {
    let opts = Opts::try_parse_from(["depmanifest", "check"]).unwrap();

    assert_eq!(opts.manifest, crate::recipe::DEFAULT_MANIFEST_FILE_NAME);
    assert!(matches!(opts.subcommand, SubCommandStruct::Check));
  }

  #[test]
  fn install_command_line_is_parsed() {
    let opts = Opts::try_parse_from([
      "depmanifest", "--manifest", "project/deps.yaml",
      "install", "-s", "os=Linux", "-s", "arch=armv8", "-o", "spdlog:shared=True", "--build", "missing"
    ]).unwrap();

    assert_eq!(opts.manifest, "project/deps.yaml");

    match opts.subcommand {
      SubCommandStruct::Install(install_command) => {
        assert_eq!(install_command.settings_args.settings, vec!["os=Linux", "arch=armv8"]);
        assert_eq!(install_command.options, vec!["spdlog:shared=True"]);
        assert_eq!(install_command.build.map(BuildPolicy::from), Some(BuildPolicy::Missing));
        assert_eq!(install_command.output_folder, "build/generators");
        assert_eq!(install_command.index, None);
      },
      _ => panic!("Expected the install subcommand")
    }
  }
}
