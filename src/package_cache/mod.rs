use std::{collections::BTreeMap, fs, io, path::{Path, PathBuf}};

use serde::{Serialize, Deserialize};

const BINARY_RECORD_FILE_NAME: &'static str = "binary.yaml";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub enum BinaryOrigin {
  #[serde(rename = "download")]
  Download,
  #[serde(rename = "build")]
  Build
}

/// Written next to every binary in the cache. Its presence is what marks the
/// binary as complete.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CachedBinaryRecord {
  pub reference: String,
  pub package_id: String,
  pub origin: BinaryOrigin,
  pub settings: BTreeMap<String, String>,
  pub options: BTreeMap<String, String>
}

/*
  Layout:
    <root>/<name>/<version>/<package_id>/binary.yaml
    <root>/<name>/<version>/<package_id>/<include and lib dirs>
*/
pub struct LocalPackageCache {
  root: PathBuf
}

impl LocalPackageCache {
  pub fn new(root: impl AsRef<Path>) -> Self {
    Self {
      root: root.as_ref().to_path_buf()
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn package_folder(&self, name: &str, version: &str, package_id: &str) -> PathBuf {
    self.root
      .join(name)
      .join(version)
      .join(package_id)
  }

  pub fn read_record(&self, name: &str, version: &str, package_id: &str) -> Result<Option<CachedBinaryRecord>, String> {
    let record_path: PathBuf = self.package_folder(name, version, package_id).join(BINARY_RECORD_FILE_NAME);

    if !record_path.is_file() {
      return Ok(None);
    }

    let contents: String = fs::read_to_string(&record_path)
      .map_err(|err| format!("Unable to read '{}': {}", record_path.to_string_lossy(), err.to_string()))?;

    return serde_yaml::from_str(&contents)
      .map(Some)
      .map_err(|err| format!("Cached binary record '{}' is corrupt: {}", record_path.to_string_lossy(), err.to_string()));
  }

  /*
    The record is written to a temporary file and renamed into place last, so
    an interrupted store never leaves something that looks like a complete
    binary.
  */
  pub fn store(
    &self,
    name: &str,
    version: &str,
    record: &CachedBinaryRecord,
    layout_dirs: &[String]
  ) -> io::Result<PathBuf> {
    let package_folder: PathBuf = self.package_folder(name, version, &record.package_id);
    fs::create_dir_all(&package_folder)?;

    for layout_dir in layout_dirs {
      fs::create_dir_all(package_folder.join(layout_dir))?;
    }

    let serialized_record: String = serde_yaml::to_string(record)
      .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    let temp_record_path: PathBuf = package_folder.join(format!("{}.tmp", BINARY_RECORD_FILE_NAME));
    fs::write(&temp_record_path, serialized_record)?;
    fs::rename(&temp_record_path, package_folder.join(BINARY_RECORD_FILE_NAME))?;

    return Ok(package_folder);
  }
}
