//! Common constants used throughout kiln.

/// Server source root, relative to the project root.
pub const SERVER_MAIN_SRC_DIR: &str = "src/main/java/";

/// Server resource root, relative to the project root.
pub const SERVER_MAIN_RES_DIR: &str = "src/main/resources/";

/// Server test source root, relative to the project root.
pub const SERVER_TEST_SRC_DIR: &str = "src/test/java/";

/// Server test resource root, relative to the project root.
pub const SERVER_TEST_RES_DIR: &str = "src/test/resources/";

/// Default interpolation pattern: `<%= expression %>`.
pub const DEFAULT_INTERPOLATE_PATTERN: &str = r"(?s)<%=\s*(.+?)\s*%>";

/// Escape-aware interpolation pattern: `<%: expression %>`.
/// Used for files whose own syntax already contains `<%=`-like markers.
pub const ESCAPED_INTERPOLATE_PATTERN: &str = r"(?s)<%:\s*(.+?)\s*%>";

/// Suffix marking a source as an interpolation template in a template directory.
/// The suffix only selects the file; its content is still processed by the
/// interpolation pattern, never rendered as a full MiniJinja template.
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Context files searched in the output directory, in order.
pub const CONTEXT_FILES: [&str; 4] =
    [".yo-rc.json", "generator.json", "generator.yml", "generator.yaml"];

/// Namespace key under which the persisted options may be nested.
pub const CONTEXT_NAMESPACE: &str = "generator-jhipster";

/// Context key recording the generator version of the previous run.
pub const PREVIOUS_VERSION_KEY: &str = "jhipsterVersion";
