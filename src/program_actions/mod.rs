mod install;
mod manage_dependencies;
pub mod info_printers;

pub use install::*;
pub use manage_dependencies::*;
