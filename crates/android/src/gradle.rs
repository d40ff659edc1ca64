//! Gradle build system integration
//!
//! Runs tasks through the project's Gradle wrapper. Release tasks resolve
//! signing first so a broken `key.properties` stops the build before Gradle
//! starts.
//!
//! The app's build script only checks that `-Pkey.properties` is set; it then
//! reads `key.properties` from the Android project directory regardless of
//! the value passed.

use crate::signing::{SigningIdentity, SigningResolver, GRADLE_FLAG};
use aningcall_core::error::{Error, ErrorCode, Result, ResultExt};
use aningcall_core::process::run_command_streaming_in_dir;
use aningcall_core::validation::Validator;
use std::path::{Path, PathBuf};

/// Gradle tasks the tooling knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradleTask {
    AssembleDebug,
    AssembleRelease,
    BundleDebug,
    BundleRelease,
    Clean,
}

impl GradleTask {
    /// Pick the build task for a configuration
    pub fn build(release: bool, bundle: bool) -> Self {
        match (release, bundle) {
            (false, false) => Self::AssembleDebug,
            (true, false) => Self::AssembleRelease,
            (false, true) => Self::BundleDebug,
            (true, true) => Self::BundleRelease,
        }
    }

    /// Gradle task name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssembleDebug => "assembleDebug",
            Self::AssembleRelease => "assembleRelease",
            Self::BundleDebug => "bundleDebug",
            Self::BundleRelease => "bundleRelease",
            Self::Clean => "clean",
        }
    }

    /// Whether the task produces a signed release artifact
    pub fn is_release(&self) -> bool {
        matches!(self, Self::AssembleRelease | Self::BundleRelease)
    }
}

/// Wrapper script name for this platform
pub fn wrapper_name() -> &'static str {
    if cfg!(windows) { "gradlew.bat" } else { "gradlew" }
}

/// Path of the wrapper inside an Android project directory
pub fn wrapper_path(android_dir: &Path) -> PathBuf {
    android_dir.join(wrapper_name())
}

/// Whether the Android project has a Gradle wrapper
pub fn has_wrapper(android_dir: &Path) -> bool {
    wrapper_path(android_dir).is_file()
}

/// The signing properties file the Gradle script reads
pub fn gradle_properties_file(android_dir: &Path) -> PathBuf {
    android_dir.join(GRADLE_FLAG)
}

/// The file Gradle will read, when it is not `properties_file`
///
/// A Gradle file that does not exist counts as different, since the build
/// would then be debug-signed.
pub fn properties_mismatch(android_dir: &Path, properties_file: &Path) -> Option<PathBuf> {
    let gradle_file = gradle_properties_file(android_dir);
    let same = match (gradle_file.canonicalize(), properties_file.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    (!same).then_some(gradle_file)
}

/// Command-line arguments for a task
///
/// Release tasks signed with a release identity get `-Pkey.properties`,
/// which the Gradle script checks before reading the file itself.
pub fn task_args(
    task: GradleTask,
    identity: Option<&SigningIdentity>,
    properties_file: &Path,
) -> Vec<String> {
    let mut args = vec![task.as_str().to_string()];
    if task.is_release() && identity.is_some_and(SigningIdentity::is_release) {
        args.push(format!("-P{}={}", GRADLE_FLAG, properties_file.display()));
    }
    args
}

/// Run a Gradle task, streaming its output
///
/// For release tasks signing is resolved before anything else; a
/// configuration error is returned without running Gradle.
pub fn run_task(android_dir: &Path, task: GradleTask, signing: &SigningResolver) -> Result<()> {
    let identity = if task.is_release() {
        let identity = signing.identity()?;
        tracing::info!(
            task = task.as_str(),
            identity = identity.kind(),
            "Release signing resolved"
        );
        Some(identity)
    } else {
        None
    };

    let checks = Validator::new()
        .is_directory("android_dir", android_dir)
        .is_file("gradlew", &wrapper_path(android_dir))
        .validate();
    if !checks.is_valid() {
        let failed: Vec<String> = checks.errors().iter().map(ToString::to_string).collect();
        return Err(Error::gradle(format!(
            "Gradle wrapper not found in {}",
            android_dir.display()
        ))
        .with_context(failed.join("; "))
        .with_suggestion("Run from the Flutter project root or pass --project-dir"));
    }

    let android_dir = android_dir
        .canonicalize()
        .map_err(Error::from)
        .context(format!("Resolving {}", android_dir.display()))?;
    if identity.as_ref().is_some_and(SigningIdentity::is_release) {
        if let Some(gradle_file) = properties_mismatch(&android_dir, signing.properties_path()) {
            tracing::warn!(
                resolved = %signing.properties_path().display(),
                gradle = %gradle_file.display(),
                "Gradle signs with a different key.properties than the one checked"
            );
        }
    }

    let wrapper = wrapper_path(&android_dir);
    let args = task_args(task, identity.as_ref(), signing.properties_path());
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let code = run_command_streaming_in_dir(&wrapper.to_string_lossy(), &arg_refs, &android_dir)?;
    if code == 0 {
        Ok(())
    } else {
        Err(Error::new(
            ErrorCode::CommandFailed,
            format!("gradle {} failed with exit code {}", task.as_str(), code),
        ))
    }
}
