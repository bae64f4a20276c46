use std::{env, path::PathBuf};

pub fn depmanifest_root_dir() -> Result<PathBuf, String> {
  let user_home_var_name: &str = if cfg!(windows)
    { "USERPROFILE" }
    else { "HOME" };

  let home_dir: String = env::var(user_home_var_name)
    .map_err(|_| format!(
      "Unable to find the user's home directory because '{}' is not set. Pass '--index' and '--cache' explicitly.",
      user_home_var_name
    ))?;

  let mut root_dir = PathBuf::from(home_dir);
  root_dir.push(".depmanifest");
  return Ok(root_dir);
}

pub fn default_index_dir() -> Result<PathBuf, String> {
  Ok(depmanifest_root_dir()?.join("index"))
}

pub fn default_cache_dir() -> Result<PathBuf, String> {
  Ok(depmanifest_root_dir()?.join("cache"))
}
