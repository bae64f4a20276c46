mod cmake_deps_writer;
mod cmake_toolchain_writer;

use std::{fs, io, path::{Path, PathBuf}};

use crate::{
  recipe::GeneratorKind,
  resolver::{binary_plan::InstalledPackage, ResolveFailureReason, ResolvedGraph}
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  // Relative to the output folder.
  pub file_name: String,
  pub contents: String
}

impl GeneratedFile {
  pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
    Self {
      file_name: file_name.into(),
      contents: contents.into()
    }
  }
}

pub struct GeneratorInput<'a> {
  pub graph: &'a ResolvedGraph,
  pub installed: &'a [InstalledPackage<'a>]
}

struct GeneratorConfiguration {
  kind: GeneratorKind,
  render_func: fn(&GeneratorInput) -> Result<Vec<GeneratedFile>, String>
}

fn configuration_for(kind: GeneratorKind) -> GeneratorConfiguration {
  match kind {
    GeneratorKind::CMakeDeps => GeneratorConfiguration {
      kind,
      render_func: cmake_deps_writer::render_cmake_deps
    },
    GeneratorKind::CMakeToolchain => GeneratorConfiguration {
      kind,
      render_func: cmake_toolchain_writer::render_cmake_toolchain
    }
  }
}

/*
  Renders every requested generator in memory. Nothing touches the
  filesystem here.
*/
pub fn render_generators<FBefore, FAfter>(
  generators: &[GeneratorKind],
  input: &GeneratorInput,
  before_render: FBefore,
  after_render: FAfter
) -> Result<Vec<GeneratedFile>, ResolveFailureReason>
  where
    FBefore: Fn(GeneratorKind),
    FAfter: Fn(GeneratorKind, &[GeneratedFile])
{
  let mut all_files: Vec<GeneratedFile> = Vec::new();

  for config in generators.iter().copied().map(configuration_for) {
    before_render(config.kind);

    let rendered: Vec<GeneratedFile> = (config.render_func)(input)
      .map_err(|err_message| ResolveFailureReason::Configuration(format!(
        "Generator '{}' failed: {}",
        config.kind.name_string(),
        err_message
      )))?;

    for file in &rendered {
      if all_files.iter().any(|existing| existing.file_name == file.file_name) {
        return Err(ResolveFailureReason::Configuration(format!(
          "Generator '{}' produces '{}', which another generator already produces.",
          config.kind.name_string(),
          file.file_name
        )));
      }
    }

    after_render(config.kind, &rendered);
    all_files.extend(rendered);
  }

  return Ok(all_files);
}

fn staging_dir_in(output_folder: &Path) -> PathBuf {
  output_folder.join(format!(".depmanifest-staging-{}", std::process::id()))
}

/*
  Every file is first written into a staging directory inside the output
  folder, then moved into place. Either all files make it to the staging
  directory or none are moved.
*/
pub fn write_generated_files(
  output_folder: impl AsRef<Path>,
  files: &[GeneratedFile]
) -> Result<Vec<PathBuf>, ResolveFailureReason> {
  let output_folder: &Path = output_folder.as_ref();
  let staging_dir: PathBuf = staging_dir_in(output_folder);

  let to_io_failure = |err: io::Error| ResolveFailureReason::Io(format!(
    "Unable to write generated files to '{}': {}",
    output_folder.to_string_lossy(),
    err.to_string()
  ));

  fs::create_dir_all(&staging_dir).map_err(to_io_failure)?;

  if let Err(err) = stage_files(&staging_dir, files) {
    let _ = fs::remove_dir_all(&staging_dir);
    return Err(to_io_failure(err));
  }

  let move_result: io::Result<Vec<PathBuf>> = move_staged_files(&staging_dir, output_folder, files);
  let _ = fs::remove_dir_all(&staging_dir);

  return move_result.map_err(to_io_failure);
}

fn stage_files(staging_dir: &Path, files: &[GeneratedFile]) -> io::Result<()> {
  for file in files {
    fs::write(staging_dir.join(&file.file_name), &file.contents)?;
  }

  Ok(())
}

fn move_into_place<'a>(
  staging_dir: &Path,
  output_folder: &Path,
  files: &'a [GeneratedFile],
  backed_up: &mut Vec<&'a str>,
  written: &mut Vec<PathBuf>
) -> io::Result<()> {
  for file in files {
    let final_path: PathBuf = output_folder.join(&file.file_name);

    // Windows won't rename over an existing file.
    if final_path.is_file() {
      fs::rename(&final_path, backup_path_for(staging_dir, &file.file_name))?;
      backed_up.push(&file.file_name);
    }

    fs::rename(staging_dir.join(&file.file_name), &final_path)?;
    written.push(final_path);
  }

  Ok(())
}

fn backup_path_for(staging_dir: &Path, file_name: &str) -> PathBuf {
  staging_dir.join(format!("{}.previous", file_name))
}

/*
  Existing outputs are moved into the staging directory first. If any rename
  fails, the files moved so far are removed and the previous outputs are put
  back, so the output folder ends up exactly as it was.
*/
fn move_staged_files(staging_dir: &Path, output_folder: &Path, files: &[GeneratedFile]) -> io::Result<Vec<PathBuf>> {
  for file in files {
    let final_path: PathBuf = output_folder.join(&file.file_name);

    if final_path.exists() && !final_path.is_file() {
      return Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("'{}' exists and is not a file", final_path.to_string_lossy())
      ));
    }
  }

  let mut backed_up: Vec<&str> = Vec::new();
  let mut written: Vec<PathBuf> = Vec::new();

  if let Err(err) = move_into_place(staging_dir, output_folder, files, &mut backed_up, &mut written) {
    for written_path in &written {
      let _ = fs::remove_file(written_path);
    }

    for file_name in backed_up {
      let _ = fs::rename(backup_path_for(staging_dir, file_name), output_folder.join(file_name));
    }

    return Err(err);
  }

  return Ok(written);
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use crate::{
    package_cache::LocalPackageCache,
    package_index::PackageIndex,
    recipe::{BuildPolicy, ManifestRecipe, OptionSet},
    resolver::{binary_plan::{execute_plan, plan_binaries}, resolve_graph},
    test_support::{linux_gcc_release, reference_index, REFERENCE_MANIFEST}
  };

  #[test]
  fn written_files_land_in_the_output_folder_without_staging_leftovers() {
    let output_dir = tempfile::tempdir().unwrap();
    let output_folder = output_dir.path().join("build").join("generators");

    fs::create_dir_all(&output_folder).unwrap();
    fs::write(output_folder.join("deps.cmake"), "stale").unwrap();

    let files = vec![
      GeneratedFile::new("deps.cmake", "find_package(spdlog CONFIG REQUIRED)\n"),
      GeneratedFile::new("spdlog-config.cmake", "set(spdlog_FOUND TRUE)\n")
    ];

    let written = write_generated_files(&output_folder, &files).unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(fs::read_to_string(output_folder.join("deps.cmake")).unwrap(), "find_package(spdlog CONFIG REQUIRED)\n");
    assert!(output_folder.join("spdlog-config.cmake").is_file());
    assert!(!staging_dir_in(&output_folder).exists());
  }

  #[test]
  fn failed_write_leaves_no_partial_output() {
    let output_dir = tempfile::tempdir().unwrap();

    let files = vec![
      GeneratedFile::new("deps.cmake", "find_package(spdlog CONFIG REQUIRED)\n"),
      GeneratedFile::new("nonexistent/spdlog-config.cmake", "set(spdlog_FOUND TRUE)\n")
    ];

    let failure = write_generated_files(output_dir.path(), &files).unwrap_err();

    assert!(matches!(failure, ResolveFailureReason::Io(_)), "{}", failure);
    assert_eq!(fs::read_dir(output_dir.path()).unwrap().count(), 0);
  }

  #[test]
  fn directory_in_the_way_keeps_previous_outputs_untouched() {
    let output_dir = tempfile::tempdir().unwrap();
    let output_folder = output_dir.path();

    fs::write(output_folder.join("spdlog-config.cmake"), "previous").unwrap();
    fs::create_dir_all(output_folder.join("deps.cmake").join("nested")).unwrap();

    let files = vec![
      GeneratedFile::new("spdlog-config.cmake", "set(spdlog_FOUND TRUE)\n"),
      GeneratedFile::new("cli11-config.cmake", "set(CLI11_FOUND TRUE)\n"),
      GeneratedFile::new("deps.cmake", "find_package(spdlog CONFIG REQUIRED)\n")
    ];

    let failure = write_generated_files(output_folder, &files).unwrap_err();

    assert!(matches!(failure, ResolveFailureReason::Io(_)), "{}", failure);
    assert_eq!(fs::read_to_string(output_folder.join("spdlog-config.cmake")).unwrap(), "previous");
    assert!(!output_folder.join("cli11-config.cmake").exists());
    assert!(output_folder.join("deps.cmake").join("nested").is_dir());
    assert!(!staging_dir_in(output_folder).exists());
  }

  #[test]
  fn failed_rename_restores_replaced_outputs() {
    let output_dir = tempfile::tempdir().unwrap();
    let output_folder = output_dir.path();
    let staging_dir = staging_dir_in(output_folder);

    fs::write(output_folder.join("spdlog-config.cmake"), "previous").unwrap();
    fs::create_dir_all(&staging_dir).unwrap();

    let files = vec![
      GeneratedFile::new("spdlog-config.cmake", "set(spdlog_FOUND TRUE)\n"),
      GeneratedFile::new("deps.cmake", "find_package(spdlog CONFIG REQUIRED)\n")
    ];

    // Only the first file is staged, so moving the second one fails.
    fs::write(staging_dir.join("spdlog-config.cmake"), &files[0].contents).unwrap();

    assert!(move_staged_files(&staging_dir, output_folder, &files).is_err());
    assert_eq!(fs::read_to_string(output_folder.join("spdlog-config.cmake")).unwrap(), "previous");
    assert!(!output_folder.join("deps.cmake").exists());
  }

  #[test]
  fn renders_each_requested_generator_in_order() {
    let index_dir = reference_index();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = LocalPackageCache::new(cache_dir.path());
    let recipe = ManifestRecipe::from_yaml_str(REFERENCE_MANIFEST, "labs").unwrap();
    let graph = resolve_graph(&recipe, &linux_gcc_release(), &OptionSet::new(), &mut PackageIndex::new(index_dir.path())).unwrap();
    let planned = plan_binaries(&graph, BuildPolicy::Missing, &cache).unwrap();
    let installed = execute_plan(&graph, planned, &cache).unwrap();

    let rendered_kinds: RefCell<Vec<GeneratorKind>> = RefCell::new(Vec::new());

    let files = render_generators(
      &[GeneratorKind::CMakeDeps, GeneratorKind::CMakeToolchain],
      &GeneratorInput { graph: &graph, installed: &installed },
      |_| {},
      |kind, _| rendered_kinds.borrow_mut().push(kind)
    ).unwrap();

    assert_eq!(rendered_kinds.into_inner(), vec![GeneratorKind::CMakeDeps, GeneratorKind::CMakeToolchain]);
    assert!(files.iter().any(|file| file.file_name == "deps.cmake"));
    assert!(files.iter().any(|file| file.file_name == "toolchain.cmake"));
    // Three files per package plus the aggregate file and the toolchain.
    assert_eq!(files.len(), 5 * 3 + 2);
  }
}
