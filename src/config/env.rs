//! Environment variable names recognized by spicebind

pub const ENV_PYTHON_INCLUDE: &str = "SPICEBIND_PYTHON_INCLUDE";
pub const ENV_SITE_PACKAGES: &str = "SPICEBIND_SITE_PACKAGES";
pub const ENV_TOOLKIT_DIR: &str = "SPICEBIND_TOOLKIT_DIR";
pub const ENV_SWIG: &str = "SPICEBIND_SWIG";
pub const ENV_CC: &str = "SPICEBIND_CC";
pub const ENV_LINKER: &str = "SPICEBIND_LINKER";
