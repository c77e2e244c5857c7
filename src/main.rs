//! signca command line: `root` creates a signing set, `sign` issues a
//! certificate from one.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use signca::authority::{Authority, CertSetNames, SigningSet};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signca")]
#[command(about = "Minimal certificate authority: create a root and sign host certificates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a self-signed root signing set
    Root {
        /// Organization name of the signing authority
        #[arg(long, default_value = "signing.example.com")]
        host: String,

        /// Base file name; writes <filename>.pem and <filename>-key.pem
        #[arg(long, default_value = "signing-cert")]
        filename: String,
    },

    /// Create a certificate signed by an existing signing set
    Sign {
        /// DNS name of the host to create the certificate for
        #[arg(long, default_value = "signed.example.com")]
        host: String,

        /// Base file name; writes <filename>.pem and <filename>-key.pem
        #[arg(long, default_value = "signed-certificate")]
        filename: String,

        /// Base file name of the signing set to sign with
        #[arg(long, default_value = "signing-cert")]
        signer: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    let mut authority = Authority::new();
    match command {
        Commands::Root { host, filename } => {
            let (names, set) = authority
                .create_root_signing_set(&filename, &host)
                .with_context(|| format!("could not create signing set {filename}"))?;
            report(&names, &set)
        }
        Commands::Sign {
            host,
            filename,
            signer,
        } => {
            let (names, set) = authority
                .create_signed_certificate(&filename, &host, &signer)
                .with_context(|| {
                    format!("could not create certificate {filename} for {host} signed by {signer}")
                })?;
            report(&names, &set)
        }
    }
}

fn report(names: &CertSetNames, set: &SigningSet) -> anyhow::Result<()> {
    tracing::info!(
        certificate = %names.certificate.display(),
        serial = %set.cert.serial_number()?,
        subject = ?set.cert.subject_organizations(),
        dns_names = ?set.cert.dns_names()?,
        "wrote certificate"
    );
    tracing::info!(private_key = %names.private_key.display(), "wrote private key");
    Ok(())
}
