//! Default configuration values

/// Project configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "spicebind.toml";

/// Default interface-definition file
pub const DEFAULT_INTERFACE: &str = "cspice.i";

/// Default SWIG module name
pub const DEFAULT_MODULE: &str = "cspice";

/// Default toolkit directory (or symlink to an external CSPICE installation)
pub const DEFAULT_TOOLKIT_DIR: &str = "cspice";

/// Header directory inside the toolkit
pub const TOOLKIT_INCLUDE_SUBDIR: &str = "include";

/// Header that marks a usable toolkit include directory
pub const TOOLKIT_HEADER: &str = "SpiceUsr.h";

/// Static library inside the toolkit
pub const TOOLKIT_LIBRARY: &str = "lib/cspice.a";

/// Default interface generator
pub const DEFAULT_SWIG: &str = "swig";

/// Default C compiler
pub const DEFAULT_CC: &str = "cc";

/// Default linker driver
pub const DEFAULT_LINKER: &str = "cc";

/// Default Python interpreter for `detect`
pub const DEFAULT_PYTHON: &str = "python3";

/// NumPy header locations relative to site-packages, newest layout last
pub const NUMPY_INCLUDE_CANDIDATES: &[&str] = &["numpy/core/include", "numpy/_core/include"];

/// Header that marks a usable Python include directory
pub const PYTHON_HEADER: &str = "Python.h";

/// Header that marks a usable NumPy include directory
pub const NUMPY_HEADER: &str = "numpy/arrayobject.h";

/// Oldest SWIG release with the Python 3 and NumPy typemaps the interface needs
pub const MIN_SWIG_VERSION: &str = "3.0.0";

/// Suffix of the linker's staging output
pub const STAGING_SUFFIX: &str = ".partial";
