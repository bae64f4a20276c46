use crate::{
  common::basic_configure_replace,
  recipe::settings::{AxisValue, CompilerKind, Settings, TargetArch}
};

use super::{GeneratedFile, GeneratorInput};

pub const TOOLCHAIN_FILE_NAME: &'static str = "toolchain.cmake";

const TOOLCHAIN_TEMPLATE: &'static str = r#"# Toolchain for @RECIPE_NAME@ (@SETTINGS@)
include_guard()
@BUILD_TYPE_SECTION@@COMPILER_SECTION@@ARCH_FLAGS_SECTION@
list(PREPEND CMAKE_PREFIX_PATH "${CMAKE_CURRENT_LIST_DIR}")
list(PREPEND CMAKE_MODULE_PATH "${CMAKE_CURRENT_LIST_DIR}")
"#;

fn compiler_executables(compiler: CompilerKind) -> (&'static str, &'static str) {
  match compiler {
    CompilerKind::GCC => ("gcc", "g++"),
    CompilerKind::Clang | CompilerKind::AppleClang => ("clang", "clang++"),
    CompilerKind::MSVC => ("cl", "cl")
  }
}

fn build_type_section(settings: &Settings) -> String {
  match settings.build_type {
    None => String::new(),
    Some(build_type) => format!(
      "\nset(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"Build type\" FORCE)\n",
      build_type.name_string()
    )
  }
}

fn compiler_section(settings: &Settings) -> String {
  match settings.compiler {
    None => String::new(),
    Some(compiler) => {
      let (c_compiler, cxx_compiler) = compiler_executables(compiler);
      format!(
        "\nset(CMAKE_C_COMPILER {})\nset(CMAKE_CXX_COMPILER {})\n",
        c_compiler,
        cxx_compiler
      )
    }
  }
}

// MSVC picks the architecture from the environment it is run in.
fn arch_flags_section(settings: &Settings) -> String {
  let is_msvc: bool = settings.compiler == Some(CompilerKind::MSVC);

  match settings.arch {
    Some(TargetArch::X86) if !is_msvc => String::from(
      "\nstring(APPEND CMAKE_C_FLAGS_INIT \" -m32\")\nstring(APPEND CMAKE_CXX_FLAGS_INIT \" -m32\")\nstring(APPEND CMAKE_EXE_LINKER_FLAGS_INIT \" -m32\")\nstring(APPEND CMAKE_SHARED_LINKER_FLAGS_INIT \" -m32\")\n"
    ),
    _ => String::new()
  }
}

pub fn render_cmake_toolchain(input: &GeneratorInput) -> Result<Vec<GeneratedFile>, String> {
  let settings: &Settings = &input.graph.settings;

  let contents: String = basic_configure_replace(
    TOOLCHAIN_TEMPLATE,
    [
      ("RECIPE_NAME", input.graph.recipe_name.clone()),
      ("SETTINGS", settings.to_string()),
      ("BUILD_TYPE_SECTION", build_type_section(settings)),
      ("COMPILER_SECTION", compiler_section(settings)),
      ("ARCH_FLAGS_SECTION", arch_flags_section(settings))
    ]
  );

  return Ok(vec![GeneratedFile::new(TOOLCHAIN_FILE_NAME, contents)]);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{recipe::SettingsAxis, resolver::ResolvedGraph, test_support::linux_gcc_release};

  fn toolchain_for(settings: Settings) -> String {
    let graph = ResolvedGraph {
      recipe_name: String::from("labs"),
      settings,
      settings_axes: vec![SettingsAxis::Os, SettingsAxis::Compiler, SettingsAxis::BuildType, SettingsAxis::Arch],
      packages: Vec::new()
    };

    let mut files = render_cmake_toolchain(&GeneratorInput { graph: &graph, installed: &[] }).unwrap();
    assert_eq!(files.len(), 1);
    files.remove(0).contents
  }

  #[test]
  fn gcc_release_toolchain() {
    let contents = toolchain_for(linux_gcc_release());

    assert!(contents.contains("set(CMAKE_BUILD_TYPE \"Release\" CACHE STRING \"Build type\" FORCE)"), "{}", contents);
    assert!(contents.contains("set(CMAKE_C_COMPILER gcc)"), "{}", contents);
    assert!(contents.contains("set(CMAKE_CXX_COMPILER g++)"), "{}", contents);
    assert!(contents.contains("list(PREPEND CMAKE_PREFIX_PATH \"${CMAKE_CURRENT_LIST_DIR}\")"), "{}", contents);
    assert!(contents.contains("list(PREPEND CMAKE_MODULE_PATH \"${CMAKE_CURRENT_LIST_DIR}\")"), "{}", contents);
    assert!(!contents.contains("-m32"), "{}", contents);
  }

  #[test]
  fn x86_adds_m32_except_for_msvc() {
    let mut clang_x86 = linux_gcc_release();
    clang_x86.set_from_str("compiler", "clang").unwrap();
    clang_x86.set_from_str("arch", "x86").unwrap();

    let clang_contents = toolchain_for(clang_x86.clone());
    assert!(clang_contents.contains("set(CMAKE_CXX_COMPILER clang++)"), "{}", clang_contents);
    assert!(clang_contents.contains("-m32"), "{}", clang_contents);

    let mut msvc_x86 = clang_x86;
    msvc_x86.set_from_str("os", "Windows").unwrap();
    msvc_x86.set_from_str("compiler", "msvc").unwrap();

    let msvc_contents = toolchain_for(msvc_x86);
    assert!(msvc_contents.contains("set(CMAKE_C_COMPILER cl)"), "{}", msvc_contents);
    assert!(!msvc_contents.contains("-m32"), "{}", msvc_contents);
  }

  #[test]
  fn unset_settings_are_left_to_cmake() {
    let contents = toolchain_for(Settings::new());

    assert!(!contents.contains("CMAKE_BUILD_TYPE"), "{}", contents);
    assert!(!contents.contains("CMAKE_C_COMPILER"), "{}", contents);
    assert!(contents.contains("(<no settings>)"), "{}", contents);
  }
}
