//! aningcall Android CLI
//!
//! Release signing resolution and Gradle builds for the aningcall app.

use anyhow::Result;
use aningcall_android::gradle::{self, GradleTask};
use aningcall_android::signing::{self, SigningResolver, GRADLE_FLAG};
use aningcall_cli::output::{self, format_count, format_duration, print_json, Status};
use aningcall_core::config::Config;
use aningcall_core::error::{exit_codes, Error};
use aningcall_core::process;
use aningcall_telemetry::{TelemetryConfig, Timer};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "aningcall-android")]
#[command(about = "Release signing and build tools for the aningcall Android app")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Flutter project root
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage release signing
    Signing {
        #[command(subcommand)]
        action: SigningAction,
    },

    /// Build the app with Gradle
    Build {
        /// Build the release variant
        #[arg(long)]
        release: bool,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        #[command(flatten)]
        signing: SigningArgs,
    },

    /// Diagnose environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        signing: SigningArgs,
    },
}

#[derive(Subcommand)]
enum SigningAction {
    /// Show the identity release builds will be signed with
    Resolve {
        #[command(flatten)]
        signing: SigningArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Include passwords in the output
        #[arg(long)]
        show_secrets: bool,
    },

    /// Verify release signing is configured and the keystore exists
    Check {
        #[command(flatten)]
        signing: SigningArgs,
    },

    /// Write a template key.properties
    Init {
        /// Where to write the file (defaults to the configured location)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by every command that resolves signing
#[derive(Args, Clone, Default)]
struct SigningArgs {
    /// Resolve release signing from key.properties
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Never resolve release signing, even if configured
    #[arg(long)]
    disable: bool,

    /// Gradle-style project property; `-P key.properties` enables signing
    #[arg(short = 'P', value_name = "PROPERTY")]
    project_property: Vec<String>,

    /// Signing properties file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl SigningArgs {
    fn requested(&self) -> bool {
        self.enable
            || self
                .project_property
                .iter()
                .any(|p| p.split('=').next() == Some(GRADLE_FLAG))
    }

    /// CLI flags win over `ANINGCALL_SIGNING`, which wins over the config file
    fn resolver(&self, root: &Path, config: &Config) -> SigningResolver {
        let mut resolver = SigningResolver::from_config(root, &config.schema.signing);
        if self.disable {
            resolver = resolver.enabled(false);
        } else if self.requested() || signing::flag_from_env() {
            resolver = resolver.enabled(true);
        }
        if let Some(file) = &self.file {
            resolver = resolver.properties_file(file.clone());
        }
        resolver
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    output::set_quiet(cli.quiet);

    let config = match Config::load(cli.config.as_deref(), &cli.project_dir) {
        Ok(config) => config,
        Err(e) => {
            Status::report(&e);
            std::process::exit(exit_codes::for_error(&e));
        }
    };

    let guard = aningcall_telemetry::init_with_config(TelemetryConfig::from_logging(
        &config.schema.logging,
        cli.verbose,
        cli.quiet,
    ))?;

    let root = cli.project_dir.as_path();
    tracing::debug!(
        session_id = aningcall_telemetry::session_id(),
        project_dir = %root.display(),
        config = ?config.path,
        signing_enabled = config.schema.signing.enabled,
        "Configuration loaded"
    );

    let exit_code = match cli.command {
        Commands::Signing { action } => run_signing(action, root, &config),
        Commands::Build {
            release,
            bundle,
            clean,
            signing,
        } => run_build(release, bundle, clean, &signing.resolver(root, &config), root, &config),
        Commands::Doctor { json, signing } => {
            run_doctor(json, &signing.resolver(root, &config), root, &config)
        }
    };

    drop(guard);
    std::process::exit(exit_code);
}

fn fail(err: &Error, json: bool) -> i32 {
    if json {
        if let Err(e) = print_json(&err.to_report()) {
            Status::report(&e);
        }
    } else {
        Status::report(err);
    }
    exit_codes::for_error(err)
}

fn run_signing(action: SigningAction, root: &Path, config: &Config) -> i32 {
    match action {
        SigningAction::Resolve {
            signing,
            json,
            show_secrets,
        } => run_resolve(&signing.resolver(root, config), json, show_secrets),
        SigningAction::Check { signing } => run_check(
            &signing.resolver(root, config),
            &root.join(&config.schema.general.android_dir),
        ),
        SigningAction::Init { file, force } => {
            let path = file.unwrap_or_else(|| root.join(&config.schema.signing.properties_file));
            run_init(&path, force)
        }
    }
}

fn run_resolve(resolver: &SigningResolver, json: bool, show_secrets: bool) -> i32 {
    let identity = match resolver.identity() {
        Ok(identity) => identity,
        Err(e) => return fail(&e, json),
    };

    let summary = identity.summary(resolver.module_path(), show_secrets);
    if json {
        return match print_json(&summary) {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => fail(&e, false),
        };
    }

    if identity.is_release() {
        Status::success(&format!(
            "Release signing resolved from {}",
            resolver.properties_path().display()
        ));
    } else {
        Status::warning("No release signing configured; release builds use the debug identity");
    }
    Status::field("identity", summary.kind);
    Status::field("store file", &summary.store_file.display().to_string());
    Status::field("key alias", &summary.key_alias);
    Status::field("store password", &summary.store_password);
    Status::field("key password", &summary.key_password);

    exit_codes::SUCCESS
}

fn run_check(resolver: &SigningResolver, android_dir: &Path) -> i32 {
    let props = match resolver.resolve() {
        Ok(Some(props)) => props,
        Ok(None) if !resolver.is_enabled() => {
            Status::error("Release signing is not enabled");
            Status::info(&format!(
                "Pass --enable or -P {}, or set {}=1",
                GRADLE_FLAG,
                signing::SIGNING_ENV
            ));
            return exit_codes::FAILURE;
        }
        Ok(None) => {
            Status::error(&format!(
                "Signing properties not found: {}",
                resolver.properties_path().display()
            ));
            Status::info("Run `aningcall-android signing init` to create one");
            return exit_codes::FAILURE;
        }
        Err(e) => return fail(&e, false),
    };

    match props.validate_store_file(resolver.module_path()) {
        Ok(keystore) => {
            Status::success(&format!(
                "Release signing OK: key '{}' in {}",
                props.key_alias,
                keystore.display()
            ));
            if let Some(gradle_file) = gradle::properties_mismatch(android_dir, resolver.properties_path()) {
                Status::warning(&format!(
                    "Gradle signs with {}, not {}",
                    gradle_file.display(),
                    resolver.properties_path().display()
                ));
            }
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, false),
    }
}

fn run_init(path: &Path, force: bool) -> i32 {
    match signing::write_template(path, force) {
        Ok(()) => {
            Status::success(&format!("Wrote {}", path.display()));
            Status::info("Fill in the real values and keep the file out of version control");
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, false),
    }
}

fn run_build(
    release: bool,
    bundle: bool,
    clean: bool,
    resolver: &SigningResolver,
    root: &Path,
    config: &Config,
) -> i32 {
    let android_dir = root.join(&config.schema.general.android_dir);

    if clean {
        Status::info("Cleaning...");
        if let Err(e) = gradle::run_task(&android_dir, GradleTask::Clean, resolver) {
            return fail(&e, false);
        }
    }

    let task = GradleTask::build(release, bundle);
    Status::info(&format!(
        "Building {} {}...",
        if release { "release" } else { "debug" },
        if bundle { "bundle" } else { "APK" }
    ));

    let timer = Timer::start(task.as_str());
    match gradle::run_task(&android_dir, task, resolver) {
        Ok(()) => {
            Status::success(&format!("Build succeeded in {}", format_duration(timer.stop())));
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, false),
    }
}

#[derive(Serialize)]
struct ToolCheck {
    name: &'static str,
    path: Option<PathBuf>,
}

#[derive(Serialize)]
struct DoctorReport {
    tools: Vec<ToolCheck>,
    gradle_wrapper: bool,
    signing: String,
    healthy: bool,
}

fn run_doctor(json: bool, resolver: &SigningResolver, root: &Path, config: &Config) -> i32 {
    let tools: Vec<ToolCheck> = ["java", "keytool"]
        .into_iter()
        .map(|name| ToolCheck {
            name,
            path: process::which_command(name),
        })
        .collect();
    let gradle_wrapper = gradle::has_wrapper(&root.join(&config.schema.general.android_dir));

    let (signing, healthy) = match resolver.resolve() {
        Ok(Some(props)) => (format!("release (key '{}')", props.key_alias), true),
        Ok(None) if resolver.is_enabled() => ("debug (signing properties not found)".to_string(), true),
        Ok(None) => ("debug (release signing not enabled)".to_string(), true),
        Err(e) => (format!("error: {}", e.message), false),
    };

    if json {
        let report = DoctorReport {
            tools,
            gradle_wrapper,
            signing,
            healthy,
        };
        if let Err(e) = print_json(&report) {
            return fail(&e, false);
        }
    } else {
        Status::header("Environment Check");
        for tool in &tools {
            match &tool.path {
                Some(path) => Status::success(&format!("{}: {}", tool.name, path.display())),
                None => Status::warning(&format!("{}: not found", tool.name)),
            }
        }
        let missing = tools.iter().filter(|t| t.path.is_none()).count();
        if missing > 0 {
            Status::info(&format!(
                "{} missing; install a JDK to build release artifacts",
                format_count(missing, "tool", "tools")
            ));
        }

        if gradle_wrapper {
            Status::success("Gradle wrapper: found");
        } else {
            Status::warning("Gradle wrapper: not found");
        }

        if healthy {
            Status::success(&format!("Signing: {}", signing));
        } else {
            Status::error(&format!("Signing: {}", signing));
        }
    }

    if healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::CONFIG_ERROR
    }
}
