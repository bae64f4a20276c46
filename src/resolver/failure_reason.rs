use thiserror::Error;

/*
  Every failure is fatal to the invocation. The message carries all the
  context, which is added as the failure travels upward with map_message.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailureReason {
  // A requirement can't be matched to an available package, version, revision or binary.
  #[error("Resolution error: {0}")]
  Resolution(String),
  // An option, condition, setting or file refers to something undefined or malformed.
  #[error("Configuration error: {0}")]
  Configuration(String),
  // Building a package from source isn't possible for the given settings.
  #[error("Build error: {0}")]
  Build(String),
  #[error("I/O error: {0}")]
  Io(String)
}

impl ResolveFailureReason {
  pub fn map_message(
    self,
    mapper: impl FnOnce(String) -> String
  ) -> Self {
    match self {
      Self::Resolution(err_message) => Self::Resolution(mapper(err_message)),
      Self::Configuration(err_message) => Self::Configuration(mapper(err_message)),
      Self::Build(err_message) => Self::Build(mapper(err_message)),
      Self::Io(err_message) => Self::Io(mapper(err_message))
    }
  }

  pub fn is_resolution(&self) -> bool {
    matches!(self, Self::Resolution(_))
  }

  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::Configuration(_))
  }

  pub fn is_build(&self) -> bool {
    matches!(self, Self::Build(_))
  }
}
