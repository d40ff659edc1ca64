//! Release signing configuration
//!
//! Resolves the release signing identity from `key.properties`, the way the
//! app's Gradle script does it:
//!
//! 1. Resolution only happens when it is switched on (Gradle's
//!    `-Pkey.properties`, `--enable`, `ANINGCALL_SIGNING` or the config file).
//! 2. A missing file is not an error; the build falls back to the debug
//!    identity.
//! 3. A file that exists must be well formed and carry all four keys. A broken
//!    file fails loudly instead of silently producing debug-signed releases.
//!
//! # Example
//!
//! ```rust,no_run
//! use aningcall_android::signing::SigningResolver;
//! use std::path::Path;
//!
//! let identity = SigningResolver::new(Path::new("."))
//!     .enabled(true)
//!     .identity()
//!     .expect("broken key.properties");
//!
//! println!("signing with {} key {}", identity.kind(), identity.properties().key_alias);
//! ```

use aningcall_core::config::SigningConfig;
use aningcall_core::error::{Error, Result, ResultExt};
use aningcall_core::properties::Properties;
use aningcall_core::validation::Validator;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Gradle project property that opts into release signing
pub const GRADLE_FLAG: &str = "key.properties";

/// Environment variable that opts into release signing
pub const SIGNING_ENV: &str = "ANINGCALL_SIGNING";

/// Default location of the signing properties, relative to the project root
pub const DEFAULT_PROPERTIES_FILE: &str = "android/key.properties";

/// Default app module directory, relative to the project root
pub const DEFAULT_MODULE_DIR: &str = "android/app";

pub const KEY_STORE_FILE: &str = "storeFile";
pub const KEY_STORE_PASSWORD: &str = "storePassword";
pub const KEY_ALIAS: &str = "keyAlias";
pub const KEY_PASSWORD: &str = "keyPassword";

/// Keys every signing properties file must define, in reporting order
pub const REQUIRED_KEYS: [&str; 4] = [KEY_STORE_FILE, KEY_STORE_PASSWORD, KEY_ALIAS, KEY_PASSWORD];

const REDACTED: &str = "********";

/// Credentials for signing an artifact
///
/// All four fields come from one source. Passwords are redacted from
/// `Debug` output and skipped when serializing.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SigningProperties {
    /// Keystore path as written in the properties file
    pub store_file: PathBuf,
    #[serde(skip_serializing)]
    pub store_password: String,
    pub key_alias: String,
    #[serde(skip_serializing)]
    pub key_password: String,
}

impl fmt::Debug for SigningProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningProperties")
            .field("store_file", &self.store_file)
            .field("store_password", &REDACTED)
            .field("key_alias", &self.key_alias)
            .field("key_password", &REDACTED)
            .finish()
    }
}

impl SigningProperties {
    /// Build from parsed properties, reporting every missing key at once
    ///
    /// `source` is only used in error messages. Empty or whitespace-only
    /// values count as missing.
    pub fn from_properties(props: &Properties, source: &Path) -> Result<Self> {
        let missing = REQUIRED_KEYS
            .iter()
            .fold(Validator::new(), |v, key| v.required_opt(key, props.get(key)))
            .validate();

        let missing_keys = missing.failed_fields("REQUIRED");
        if !missing_keys.is_empty() {
            return Err(Error::signing_keys_missing(source, &missing_keys));
        }

        for key in props.keys().filter(|k| !REQUIRED_KEYS.contains(k)) {
            tracing::debug!(key, file = %source.display(), "Ignoring unknown signing property");
        }

        let value = |key: &str| props.get(key).unwrap_or_default().to_string();
        Ok(Self {
            store_file: PathBuf::from(value(KEY_STORE_FILE)),
            store_password: value(KEY_STORE_PASSWORD),
            key_alias: value(KEY_ALIAS),
            key_password: value(KEY_PASSWORD),
        })
    }

    /// The Android SDK debug identity
    ///
    /// Lives in `$ANDROID_USER_HOME`, or `~/.android` when that is unset.
    pub fn debug() -> Self {
        let android_home = std::env::var_os("ANDROID_USER_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".android"));

        Self {
            store_file: android_home.join("debug.keystore"),
            store_password: "android".to_string(),
            key_alias: "androiddebugkey".to_string(),
            key_password: "android".to_string(),
        }
    }

    /// Keystore path, with relative paths resolved against `module_dir`
    pub fn resolved_store_file(&self, module_dir: &Path) -> PathBuf {
        if self.store_file.is_absolute() {
            self.store_file.clone()
        } else {
            module_dir.join(&self.store_file)
        }
    }

    /// Check that the keystore exists, returning its resolved path
    pub fn validate_store_file(&self, module_dir: &Path) -> Result<PathBuf> {
        let path = self.resolved_store_file(module_dir);
        let result = Validator::new().is_file(KEY_STORE_FILE, &path).validate();
        if result.is_valid() {
            Ok(path)
        } else {
            Err(Error::keystore_not_found(&path))
        }
    }
}

/// Resolve release signing properties
///
/// Returns `Ok(None)` when `flag_present` is false (the file is not
/// touched) or when the file does not exist. A file whose existence cannot
/// be determined, or that exists but cannot be read, is malformed, or lacks
/// a required key, is an error.
pub fn resolve(flag_present: bool, properties_file: &Path) -> Result<Option<SigningProperties>> {
    if !flag_present {
        tracing::debug!("Release signing not requested");
        return Ok(None);
    }

    let exists = properties_file.try_exists().map_err(|e| {
        Error::signing(format!(
            "Cannot access signing properties {}: {}",
            properties_file.display(),
            e
        ))
        .with_source(e)
    })?;
    if !exists {
        tracing::debug!(
            file = %properties_file.display(),
            "Signing properties not found"
        );
        return Ok(None);
    }

    let bytes = std::fs::read(properties_file).map_err(|e| {
        Error::signing(format!(
            "Cannot read signing properties {}: {}",
            properties_file.display(),
            e
        ))
        .with_source(e)
    })?;

    let props = Properties::from_utf8(&bytes)
        .map_err(|e| Error::signing_parse(properties_file, e.line, e.message))?;

    let signing = SigningProperties::from_properties(&props, properties_file)?;
    tracing::debug!(
        file = %properties_file.display(),
        key_alias = %signing.key_alias,
        "Release signing resolved"
    );
    Ok(Some(signing))
}

/// Interpret a boolean-ish flag value such as an environment variable
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Whether [`SIGNING_ENV`] opts into release signing
pub fn flag_from_env() -> bool {
    std::env::var(SIGNING_ENV).is_ok_and(|v| parse_flag(&v))
}

/// The identity a release build will be signed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningIdentity {
    /// Resolved from the signing properties file
    Release(SigningProperties),
    /// Fallback Android debug identity
    Debug(SigningProperties),
}

impl SigningIdentity {
    /// Credentials for this identity
    pub fn properties(&self) -> &SigningProperties {
        match self {
            Self::Release(props) | Self::Debug(props) => props,
        }
    }

    /// Whether this is a real release identity
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release(_))
    }

    /// `"release"` or `"debug"`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Release(_) => "release",
            Self::Debug(_) => "debug",
        }
    }

    /// Summary for display; secrets are only included when asked for
    pub fn summary(&self, module_dir: &Path, show_secrets: bool) -> IdentitySummary {
        let props = self.properties();
        let store_file = match self {
            Self::Release(p) => p.resolved_store_file(module_dir),
            Self::Debug(p) => p.store_file.clone(),
        };
        let secret = |s: &str| {
            if show_secrets {
                s.to_string()
            } else {
                REDACTED.to_string()
            }
        };

        IdentitySummary {
            kind: self.kind(),
            store_file,
            key_alias: props.key_alias.clone(),
            store_password: secret(&props.store_password),
            key_password: secret(&props.key_password),
        }
    }
}

/// Printable view of a [`SigningIdentity`]
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySummary {
    pub kind: &'static str,
    pub store_file: PathBuf,
    pub key_alias: String,
    pub store_password: String,
    pub key_password: String,
}

/// Builder around [`resolve`] with project-relative defaults
#[derive(Debug, Clone)]
pub struct SigningResolver {
    enabled: bool,
    properties_file: PathBuf,
    module_dir: PathBuf,
}

impl SigningResolver {
    /// Resolver for a project root with default paths, disabled
    pub fn new(project_root: &Path) -> Self {
        Self {
            enabled: false,
            properties_file: project_root.join(DEFAULT_PROPERTIES_FILE),
            module_dir: project_root.join(DEFAULT_MODULE_DIR),
        }
    }

    /// Resolver configured from the `[signing]` config section
    pub fn from_config(project_root: &Path, config: &SigningConfig) -> Self {
        Self {
            enabled: config.enabled,
            properties_file: project_root.join(&config.properties_file),
            module_dir: project_root.join(&config.module_dir),
        }
    }

    /// Switch resolution on or off
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Use a different properties file
    pub fn properties_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_file = path.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn properties_path(&self) -> &Path {
        &self.properties_file
    }

    pub fn module_path(&self) -> &Path {
        &self.module_dir
    }

    /// Resolve the release signing properties, if any
    pub fn resolve(&self) -> Result<Option<SigningProperties>> {
        resolve(self.enabled, &self.properties_file)
    }

    /// Resolve the identity a release build will use
    ///
    /// Falls back to the debug identity when no release properties are
    /// available. Configuration errors are propagated, never downgraded.
    pub fn identity(&self) -> Result<SigningIdentity> {
        match self.resolve()? {
            Some(props) => Ok(SigningIdentity::Release(props)),
            None => {
                tracing::warn!(
                    enabled = self.enabled,
                    file = %self.properties_file.display(),
                    "No release signing configured; release builds will be debug-signed"
                );
                Ok(SigningIdentity::Debug(SigningProperties::debug()))
            }
        }
    }
}

/// Placeholder `key.properties` contents for `signing init`
pub fn template() -> Properties {
    [
        (KEY_STORE_FILE, "/path/to/upload-keystore.jks"),
        (KEY_STORE_PASSWORD, "changeit"),
        (KEY_ALIAS, "upload"),
        (KEY_PASSWORD, "changeit"),
    ]
    .into_iter()
    .collect()
}

/// Write [`template`] to `path`, refusing to replace an existing file
/// unless `force` is set
pub fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.try_exists()? && !force {
        return Err(Error::already_exists(path));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(Error::from)
            .context(format!("Creating {}", parent.display()))?;
    }
    template().store(
        path,
        Some("Release signing for the aningcall Android app.\nKeep this file out of version control."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aningcall_core::error::ErrorCode;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const RELEASE: &str = "storeFile=/keys/release.jks\nstorePassword=abc123\nkeyAlias=upload\nkeyPassword=xyz789\n";

    fn write_props(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("key.properties");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_resolve_release_properties() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, RELEASE);

        let signing = resolve(true, &path).unwrap().unwrap();
        assert_eq!(
            signing,
            SigningProperties {
                store_file: PathBuf::from("/keys/release.jks"),
                store_password: "abc123".to_string(),
                key_alias: "upload".to_string(),
                key_password: "xyz789".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_without_flag_ignores_file() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_props(&temp_dir, RELEASE);
        assert_eq!(resolve(false, &good).unwrap(), None);

        let broken = write_props(&temp_dir, "storeFile=\\u12");
        assert_eq!(resolve(false, &broken).unwrap(), None);
    }

    #[test]
    fn test_resolve_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.properties");
        assert_eq!(resolve(true, &path).unwrap(), None);
    }

    #[test]
    fn test_resolve_missing_key_alias() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(
            &temp_dir,
            "storeFile=/keys/release.jks\nstorePassword=abc123\nkeyPassword=xyz789\n",
        );

        let err = resolve(true, &path).unwrap_err();
        assert_eq!(err.code, ErrorCode::SigningKeyMissing);
        assert_eq!(err.missing_keys(), [KEY_ALIAS]);
        assert!(err.message.contains("keyAlias"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_reports_all_missing_keys_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, "keyPassword=xyz789\nstoreFile=   \n");

        let err = resolve(true, &path).unwrap_err();
        assert_eq!(err.missing_keys(), [KEY_STORE_FILE, KEY_STORE_PASSWORD, KEY_ALIAS]);
    }

    #[test]
    fn test_resolve_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, "storeFile=/keys/release.jks\nstorePassword=\\uZZZZ\n");

        let err = resolve(true, &path).unwrap_err();
        assert_eq!(err.code, ErrorCode::SigningParseError);
        assert!(err.message.contains("line 2"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_unreadable_path() {
        let temp_dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let err = resolve(true, temp_dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::SigningConfigError);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_unsearchable_directory_is_not_absent() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let path = locked.join("key.properties");
        std::fs::write(&path, RELEASE).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits, so there is nothing to check
        let denied = std::fs::metadata(&path).is_err();
        let result = resolve(true, &path);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if denied {
            let err = result.unwrap_err();
            assert_eq!(err.code, ErrorCode::SigningConfigError);
            assert!(err.message.contains("Cannot access"));
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, RELEASE);

        assert_eq!(resolve(true, &path).unwrap(), resolve(true, &path).unwrap());
    }

    #[test]
    fn test_resolve_ignores_extra_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, &format!("# upload key\n{}v1SigningEnabled=true\n", RELEASE));

        let signing = resolve(true, &path).unwrap().unwrap();
        assert_eq!(signing.key_alias, "upload");
    }

    #[test]
    fn test_debug_output_redacts_passwords() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, RELEASE);
        let signing = resolve(true, &path).unwrap().unwrap();

        let debug = format!("{:?}", signing);
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("xyz789"));
        assert!(debug.contains("upload"));

        let json = serde_json::to_string(&signing).unwrap();
        assert!(!json.contains("abc123"));
        assert!(json.contains("release.jks"));
    }

    #[test]
    fn test_resolved_store_file() {
        let signing = SigningProperties {
            store_file: PathBuf::from("keys/upload.jks"),
            ..SigningProperties::debug()
        };
        assert_eq!(
            signing.resolved_store_file(Path::new("/project/android/app")),
            PathBuf::from("/project/android/app/keys/upload.jks")
        );

        let absolute = SigningProperties {
            store_file: PathBuf::from("/keys/release.jks"),
            ..SigningProperties::debug()
        };
        assert_eq!(
            absolute.resolved_store_file(Path::new("/project/android/app")),
            PathBuf::from("/keys/release.jks")
        );
    }

    #[test]
    fn test_validate_store_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("upload.jks"), b"jks").unwrap();

        let signing = SigningProperties {
            store_file: PathBuf::from("upload.jks"),
            ..SigningProperties::debug()
        };
        assert_eq!(
            signing.validate_store_file(temp_dir.path()).unwrap(),
            temp_dir.path().join("upload.jks")
        );

        let missing = SigningProperties {
            store_file: PathBuf::from("gone.jks"),
            ..SigningProperties::debug()
        };
        let err = missing.validate_store_file(temp_dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::KeystoreNotFound);
    }

    #[test]
    fn test_parse_flag() {
        for on in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["", "0", "false", "no", "off", "maybe"] {
            assert!(!parse_flag(off), "{off}");
        }
    }

    #[test]
    fn test_resolver_defaults() {
        let resolver = SigningResolver::new(Path::new("/project"));
        assert!(!resolver.is_enabled());
        assert_eq!(
            resolver.properties_path(),
            Path::new("/project/android/key.properties")
        );
        assert_eq!(resolver.module_path(), Path::new("/project/android/app"));
    }

    #[test]
    fn test_resolver_from_config() {
        let config = SigningConfig {
            enabled: true,
            properties_file: PathBuf::from("signing/key.properties"),
            module_dir: PathBuf::from("android/app"),
        };
        let resolver = SigningResolver::from_config(Path::new("/project"), &config);
        assert!(resolver.is_enabled());
        assert_eq!(
            resolver.properties_path(),
            Path::new("/project/signing/key.properties")
        );
    }

    #[test]
    fn test_identity_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, RELEASE);

        let identity = SigningResolver::new(temp_dir.path())
            .enabled(true)
            .properties_file(&path)
            .identity()
            .unwrap();
        assert!(identity.is_release());
        assert_eq!(identity.properties().key_alias, "upload");
    }

    #[test]
    fn test_identity_falls_back_to_debug() {
        let temp_dir = TempDir::new().unwrap();

        let identity = SigningResolver::new(temp_dir.path()).identity().unwrap();
        assert_eq!(identity.kind(), "debug");
        assert_eq!(identity.properties().key_alias, "androiddebugkey");
        assert!(identity.properties().store_file.ends_with("debug.keystore"));
    }

    #[test]
    fn test_identity_propagates_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, "storeFile=/keys/release.jks\n");

        let err = SigningResolver::new(temp_dir.path())
            .enabled(true)
            .properties_file(&path)
            .identity()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SigningKeyMissing);
    }

    #[test]
    fn test_summary_redacts_unless_asked() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_props(&temp_dir, RELEASE);
        let identity = SigningIdentity::Release(resolve(true, &path).unwrap().unwrap());

        let hidden = identity.summary(temp_dir.path(), false);
        assert_eq!(hidden.store_password, REDACTED);
        assert_eq!(hidden.kind, "release");

        let shown = identity.summary(temp_dir.path(), true);
        assert_eq!(shown.store_password, "abc123");
        assert_eq!(shown.key_password, "xyz789");
    }

    #[test]
    fn test_write_template_roundtrips_through_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("android").join("key.properties");

        write_template(&path, false).unwrap();
        let signing = resolve(true, &path).unwrap().unwrap();
        assert_eq!(signing.key_alias, "upload");

        let err = write_template(&path, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        write_template(&path, true).unwrap();
    }

    proptest! {
        #[test]
        fn prop_disabled_resolution_is_always_absent(contents in "\\PC{0,200}") {
            let temp_dir = TempDir::new().unwrap();
            let path = write_props(&temp_dir, &contents);
            prop_assert_eq!(resolve(false, &path).unwrap(), None);
        }

        #[test]
        fn prop_resolved_fields_match_file(
            store in "/[a-z]{1,8}/[a-z]{1,8}\\.jks",
            store_password in "[A-Za-z0-9]{1,16}",
            alias in "[a-z][a-z0-9_-]{0,15}",
            key_password in "[A-Za-z0-9]{1,16}",
        ) {
            let temp_dir = TempDir::new().unwrap();
            let path = write_props(&temp_dir, &format!(
                "storeFile={store}\nstorePassword={store_password}\nkeyAlias={alias}\nkeyPassword={key_password}\n"
            ));

            let signing = resolve(true, &path).unwrap().unwrap();
            prop_assert_eq!(signing.store_file, PathBuf::from(store));
            prop_assert_eq!(signing.store_password, store_password);
            prop_assert_eq!(signing.key_alias, alias);
            prop_assert_eq!(signing.key_password, key_password);
        }
    }
}
