use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::recipe::DEFAULT_MANIFEST_FILE_NAME;

const SKY: &'static str = "Skylar Cupit";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CLIBuildPolicyIn {
  /// Only use prebuilt or cached binaries
  Never,
  /// Build from source when no binary is available
  Missing,
  /// Always build from source
  Always
}

#[derive(Parser)]
#[command(version, author = SKY)]
#[command(about = "Resolves the pinned dependencies of a C/C++ project and generates CMake integration files")]
pub struct Opts {
  /// Path to the dependency manifest
  #[arg(short, long, default_value = DEFAULT_MANIFEST_FILE_NAME)]
  pub manifest: String,

  #[command(subcommand)]
  pub subcommand: SubCommandStruct
}

#[derive(Subcommand)]
pub enum SubCommandStruct {
  /// Resolve every requirement, make sure a binary exists for each and write the generator files.
  Install(InstallCommand),

  /// Print the requirements the manifest declares for the given settings.
  Requirements(RequirementsCommand),

  /// List the settings axes and their allowed values.
  Settings,

  /// Validate the manifest without resolving anything.
  Check
}

#[derive(Args)]
pub struct SettingsArgs {
  /// YAML profile with 'settings' and 'options' maps
  #[arg(short, long)]
  pub profile: Option<String>,

  /// A single setting, for example '-s os=Linux'. Overrides the profile.
  #[arg(short = 's', long = "setting", value_name = "AXIS=VALUE")]
  pub settings: Vec<String>
}

#[derive(Args)]
pub struct InstallCommand {
  #[command(flatten)]
  pub settings_args: SettingsArgs,

  /// A single package option, for example '-o spdlog:shared=True'. Overrides the profile and manifest.
  #[arg(short = 'o', long = "option", value_name = "PKG:KEY=VALUE")]
  pub options: Vec<String>,

  /// Package index directory. Defaults to ~/.depmanifest/index
  #[arg(long)]
  pub index: Option<String>,

  /// Local package cache directory. Defaults to ~/.depmanifest/cache
  #[arg(long)]
  pub cache: Option<String>,

  /// Directory the generator files are written to
  #[arg(long, default_value = "build/generators")]
  pub output_folder: String,

  /// Overrides the manifest's build policy
  #[arg(value_enum, long)]
  pub build: Option<CLIBuildPolicyIn>
}

#[derive(Args)]
pub struct RequirementsCommand {
  #[command(flatten)]
  pub settings_args: SettingsArgs
}
