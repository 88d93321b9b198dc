//! Removal of artifacts left behind by older generation schemes.
//!
//! Legacy paths are grouped into [`MigrationStep`]s tagged with the version
//! that stopped generating them. New steps are appended to
//! [`SERVER_MIGRATIONS`] without touching the pass itself.

use crate::constants::{
    PREVIOUS_VERSION_KEY, SERVER_MAIN_RES_DIR, SERVER_MAIN_SRC_DIR, SERVER_TEST_RES_DIR,
    SERVER_TEST_SRC_DIR,
};
use crate::context::GeneratorContext;
use crate::error::{Error, Result};
use globset::GlobBuilder;
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

/// A `major.minor.patch` generator version. Pre-release suffixes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let core = s.trim().trim_start_matches('v');
        let core = core.split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.').map(|part| part.parse::<u64>());
        let mut next = || -> Result<u64> {
            match parts.next() {
                Some(Ok(n)) => Ok(n),
                None => Ok(0),
                Some(Err(_)) => Err(Error::ContextError(format!("invalid version '{s}'"))),
            }
        };
        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(Error::ContextError(format!("invalid version '{s}'")));
        }
        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Tree a legacy path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupRoot {
    /// `src/main/java/<package>/`
    MainSource,
    /// `src/test/java/<package>/`
    TestSource,
    MainResource,
    TestResource,
    /// The output directory itself.
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    File(&'static str),
    /// Removed recursively.
    Folder(&'static str),
    /// Every entry under the root whose relative path matches.
    Glob(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPath {
    pub root: CleanupRoot,
    pub removal: Removal,
}

impl LegacyPath {
    pub const fn file(root: CleanupRoot, path: &'static str) -> Self {
        Self { root, removal: Removal::File(path) }
    }

    pub const fn folder(root: CleanupRoot, path: &'static str) -> Self {
        Self { root, removal: Removal::Folder(path) }
    }

    pub const fn glob(root: CleanupRoot, pattern: &'static str) -> Self {
        Self { root, removal: Removal::Glob(pattern) }
    }
}

/// Legacy paths retired by one generator version.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub version: Version,
    pub paths: &'static [LegacyPath],
}

/// Concrete directories the cleanup roots map to for one run.
///
/// Source roots are package-scoped; without a package they stay unset and
/// their legacy paths are skipped.
#[derive(Debug, Clone)]
pub struct CleanupRoots {
    pub main_source: Option<PathBuf>,
    pub test_source: Option<PathBuf>,
    pub main_resource: PathBuf,
    pub test_resource: PathBuf,
    pub project: PathBuf,
}

impl CleanupRoots {
    /// Standard server layout under `output_dir`.
    pub fn for_server<P: AsRef<Path>>(output_dir: P, context: &GeneratorContext) -> Self {
        let output_dir = output_dir.as_ref();
        let package_root = |base: &str, key: &str| {
            context.get_str(key).ok().map(|dir| output_dir.join(base).join(dir))
        };
        Self {
            main_source: package_root(SERVER_MAIN_SRC_DIR, "javaDir"),
            test_source: package_root(SERVER_TEST_SRC_DIR, "testDir"),
            main_resource: output_dir.join(SERVER_MAIN_RES_DIR),
            test_resource: output_dir.join(SERVER_TEST_RES_DIR),
            project: output_dir.to_path_buf(),
        }
    }

    pub fn get(&self, root: CleanupRoot) -> Option<&Path> {
        match root {
            CleanupRoot::MainSource => self.main_source.as_deref(),
            CleanupRoot::TestSource => self.test_source.as_deref(),
            CleanupRoot::MainResource => Some(&self.main_resource),
            CleanupRoot::TestResource => Some(&self.test_resource),
            CleanupRoot::Project => Some(&self.project),
        }
    }
}

/// Ordered outcome of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Paths removed (or, in dry-run, that would be removed), in order.
    pub removed: Vec<PathBuf>,
    /// Legacy paths that were already absent.
    pub warnings: Vec<String>,
}

pub struct CleanupPass<'a> {
    steps: &'a [MigrationStep],
    dry_run: bool,
}

impl<'a> CleanupPass<'a> {
    pub fn new(steps: &'a [MigrationStep]) -> Self {
        Self { steps, dry_run: false }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Steps to apply for this context.
    ///
    /// When the context records the version of the previous generation, only
    /// steps introduced after it apply; otherwise every step does.
    pub fn applicable_steps(&self, context: &GeneratorContext) -> Vec<&'a MigrationStep> {
        let previous = match context.get_str(PREVIOUS_VERSION_KEY) {
            Ok(raw) => match raw.parse::<Version>() {
                Ok(version) => Some(version),
                Err(e) => {
                    warn!("Ignoring {PREVIOUS_VERSION_KEY}: {e}");
                    None
                }
            },
            Err(_) => None,
        };
        self.steps
            .iter()
            .filter(|step| previous.map_or(true, |previous| previous < step.version))
            .collect()
    }

    /// Removes every applicable legacy path under `roots`.
    ///
    /// Absent paths are not errors; they are listed as warnings so running the
    /// pass twice yields an empty removal list the second time. Paths covered
    /// by an earlier removal in the same pass are skipped silently.
    pub fn run(&self, context: &GeneratorContext, roots: &CleanupRoots) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        let mut claimed: Vec<PathBuf> = Vec::new();

        for step in self.applicable_steps(context) {
            debug!("Applying cleanup for {}", step.version);
            for legacy in step.paths {
                let Some(root) = roots.get(legacy.root) else {
                    debug!("Skipping {:?}: {:?} root is not known", legacy.removal, legacy.root);
                    continue;
                };
                let targets = match legacy.removal {
                    Removal::File(path) | Removal::Folder(path) => vec![root.join(path)],
                    Removal::Glob(pattern) => glob_matches(root, pattern)?,
                };
                for target in targets {
                    if claimed.iter().any(|removed| target.starts_with(removed)) {
                        debug!("'{}' was already removed", target.display());
                        continue;
                    }
                    if !self.remove(&target)? {
                        report.warnings.push(format!("'{}' does not exist", target.display()));
                        continue;
                    }
                    debug!("Removed legacy path '{}'", target.display());
                    claimed.push(target.clone());
                    report.removed.push(target);
                }
            }
        }

        Ok(report)
    }

    /// Returns false when the path does not exist.
    fn remove(&self, path: &Path) -> Result<bool> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(source) => return Err(Error::CleanupError { path: path.to_path_buf(), source }),
        };
        if self.dry_run {
            return Ok(true);
        }
        let removed = if metadata.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };
        removed
            .map(|_| true)
            .map_err(|source| Error::CleanupError { path: path.to_path_buf(), source })
    }
}

/// Entries under `root` whose relative path matches `pattern`, in walk order.
/// A matching directory is returned once, without its children.
fn glob_matches(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern).literal_separator(true).build()?.compile_matcher();
    let mut matches = Vec::new();
    if !root.is_dir() {
        return Ok(matches);
    }

    let mut entries = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = entries.next() {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(root) else { continue };
        if matcher.is_match(relative) {
            if entry.file_type().is_dir() {
                entries.skip_current_dir();
            }
            matches.push(entry.path().to_path_buf());
        }
    }
    Ok(matches)
}

use CleanupRoot::{MainResource, MainSource, Project, TestResource, TestSource};

/// Legacy server artifacts, oldest first.
pub static SERVER_MIGRATIONS: &[MigrationStep] = &[
    MigrationStep {
        version: Version::new(3, 5, 0),
        paths: &[
            LegacyPath::file(MainSource, "domain/util/JSR310DateTimeSerializer.java"),
            LegacyPath::file(MainSource, "domain/util/JSR310LocalDateDeserializer.java"),
        ],
    },
    MigrationStep {
        version: Version::new(3, 6, 0),
        paths: &[LegacyPath::file(MainSource, "config/HerokuDatabaseConfiguration.java")],
    },
    MigrationStep {
        version: Version::new(3, 10, 0),
        paths: &[
            LegacyPath::file(MainSource, "config/CloudMongoDbConfiguration.java"),
            LegacyPath::file(MainSource, "security/CustomAccessDeniedHandler.java"),
            LegacyPath::file(MainSource, "web/filter/CsrfCookieGeneratorFilter.java"),
        ],
    },
    MigrationStep {
        version: Version::new(3, 12, 0),
        paths: &[LegacyPath::glob(MainSource, "config/hazelcast/*.java")],
    },
    MigrationStep {
        version: Version::new(4, 0, 0),
        paths: &[
            LegacyPath::folder(MainSource, "async"),
            LegacyPath::file(MainSource, "config/jHipsterProperties.java"),
            LegacyPath::file(MainSource, "config/LoadBalancedResourceDetails.java"),
            LegacyPath::file(MainSource, "config/ElasticSearchConfiguration.java"),
            LegacyPath::folder(MainSource, "config/apidoc"),
            LegacyPath::file(MainSource, "config/jcache/SpringCacheRegionFactory.java"),
            LegacyPath::folder(MainSource, "config/liquibase"),
            LegacyPath::folder(MainSource, "config/locale"),
            LegacyPath::file(MainSource, "domain/util/FixedH2Dialect.java"),
            LegacyPath::file(MainSource, "domain/util/FixedPostgreSQL82Dialect.java"),
            LegacyPath::file(MainSource, "domain/util/JSR310DateConverters.java"),
            LegacyPath::file(MainSource, "domain/util/JSR310PersistenceConverters.java"),
            LegacyPath::file(MainSource, "security/AjaxAuthenticationFailureHandler.java"),
            LegacyPath::file(MainSource, "security/AjaxAuthenticationSuccessHandler.java"),
            LegacyPath::file(MainSource, "security/AjaxLogoutSuccessHandler.java"),
            LegacyPath::file(MainSource, "security/Http401UnauthorizedEntryPoint.java"),
            LegacyPath::file(TestSource, "config/elasticsearch/IndexReinitializer.java"),
            LegacyPath::file(TestSource, "rest/ProfileInfoResourceIntTest.java"),
            LegacyPath::file(MainResource, "logback-jhipster.xml"),
            LegacyPath::file(TestResource, "logback-jhipster.xml"),
        ],
    },
    MigrationStep {
        version: Version::new(5, 0, 0),
        paths: &[
            LegacyPath::file(MainSource, "config/ThymeleafConfiguration.java"),
            LegacyPath::file(MainSource, "web/rest/ProfileInfoResource.java"),
            LegacyPath::file(MainResource, "mails/activationEmail.html"),
            LegacyPath::file(MainResource, "mails/creationEmail.html"),
            LegacyPath::file(MainResource, "mails/passwordResetEmail.html"),
            LegacyPath::file(MainResource, "mails/socialRegistrationValidationEmail.html"),
            LegacyPath::file(TestResource, "mail/testEmail.html"),
            LegacyPath::file(TestSource, "web/rest/ProfileInfoResourceIntTest.java"),
            LegacyPath::file(Project, "gradle/mapstruct.gradle"),
        ],
    },
    MigrationStep {
        version: Version::new(5, 2, 2),
        paths: &[
            LegacyPath::file(MainSource, "config/ElasticsearchConfiguration.java"),
            LegacyPath::file(Project, "gradle/liquibase.gradle"),
        ],
    },
    MigrationStep {
        version: Version::new(5, 8, 0),
        paths: &[
            LegacyPath::file(MainSource, "config/MetricsConfiguration.java"),
            LegacyPath::file(TestSource, "config/MetricsConfigurationTest.java"),
        ],
    },
    MigrationStep {
        version: Version::new(6, 0, 0),
        paths: &[
            LegacyPath::file(MainSource, "web/rest/errors/CustomParameterizedException.java"),
            LegacyPath::file(MainSource, "web/rest/errors/InternalServerErrorException.java"),
            LegacyPath::file(MainSource, "web/rest/util/PaginationUtil.java"),
            LegacyPath::file(MainSource, "web/rest/util/HeaderUtil.java"),
            LegacyPath::file(TestSource, "web/rest/util/PaginationUtilUnitTest.java"),
            LegacyPath::file(MainSource, "web/rest/vm/LoggerVM.java"),
            LegacyPath::file(MainSource, "web/rest/LogsResource.java"),
            LegacyPath::file(TestSource, "web/rest/LogsResourceIntTest.java"),
            LegacyPath::file(MainSource, "config/OAuth2Configuration.java"),
            LegacyPath::file(MainSource, "security/OAuth2AuthenticationSuccessHandler.java"),
            LegacyPath::folder(MainResource, "config/tls"),
        ],
    },
    MigrationStep {
        version: Version::new(6, 4, 0),
        paths: &[
            LegacyPath::file(MainSource, "web/rest/errors/InvalidPasswordException.java"),
            LegacyPath::file(MainSource, "web/rest/errors/EmailAlreadyUsedException.java"),
            LegacyPath::file(MainSource, "web/rest/errors/LoginAlreadyUsedException.java"),
            LegacyPath::glob(TestResource, "config/application-*.yml.orig"),
        ],
    },
];
