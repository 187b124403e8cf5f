use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

mod crypto;
mod data_types;
mod db_safety;
mod error;
mod output;
mod profiles;
mod report;
mod scan_flags;
mod scanner;

use crypto::NssLoader;
use scan_flags::{DecryptFields, ScanConfig};
use scanner::Scanner;

/// Exit code for module linking/initialization failures and bad arguments
const EXIT_FATAL: i32 = 2;

#[derive(Parser)]
#[command(name = "mozilla-password-decrypt")]
#[command(about = "Decrypt saved logins of Mozilla profiles (signons.sqlite) using NSS", long_about = None)]
#[command(version)]
struct Cli {
    /// Profiles to analyze (default: auto detection)
    #[arg(value_name = "PATH")]
    profile_paths: Vec<PathBuf>,

    /// Encrypted fields to decrypt
    #[arg(long, value_enum, default_value_t = DecryptFields::Both)]
    fields: DecryptFields,

    /// NSS shared library to load instead of the system libnss3
    #[arg(long, value_name = "PATH")]
    nss_library: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for ScanConfig {
    fn from(cli: Cli) -> Self {
        Self {
            profiles: cli.profile_paths,
            fields: cli.fields,
            nss_library: cli.nss_library,
            verbose: cli.verbose,
        }
    }
}

fn main() -> Result<()> {
    let config = ScanConfig::from(Cli::parse());

    // stdout carries the JSON document, so logs go to stderr
    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        std::process::exit(EXIT_FATAL);
    }

    let profiles = if config.profiles.is_empty() {
        profiles::default_profiles()
    } else {
        config.profiles.clone()
    };
    info!("🔐 Decrypting logins of {}", config.description());

    let mut scanner = Scanner::new(NssLoader::new(config.nss_library.clone()), config.fields);
    let outcome = match scanner.scan(&profiles) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    if config.verbose {
        eprint!("{}", outcome.report.format(true));
    }
    if !outcome.report.success() {
        warn!(
            "⚠️  {} field(s) could not be decrypted",
            outcome.report.field_failures().len()
        );
    }

    output::write_document(&outcome.result, std::io::stdout().lock())?;

    std::process::exit(outcome.report.exit_code());
}
