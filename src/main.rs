mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, TlsCommands};
use dockerenv::export::{self, ContainerFilter, DryRunStore, ExportFormat, ExportOptions, ObjectStore, S3Store};
use dockerenv::inspector::DockerCli;
use dockerenv::tls::{self, VerifyOptions};
use dockerenv::{values, Config};

/// Exit status for missing flags, same as clap's own usage errors.
const USAGE_EXIT: i32 = 2;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::List => {
            let id = require(cli.container_id.as_deref(), "--container-id", &["list"]);
            let ins = DockerCli::new(&config.docker_bin);
            values::run_list(&ins, id, &mut out)
                .with_context(|| format!("listing variables of {}", id))?;
        }

        Commands::Get => {
            let id = require(cli.container_id.as_deref(), "--container-id", &["get"]);
            let var = require(cli.var_name.as_deref(), "--var", &["get"]);
            let ins = DockerCli::new(&config.docker_bin);
            values::run_get(&ins, id, var, &mut out).context("unable to get value")?;
        }

        Commands::Tls {
            command: TlsCommands::Verify { cert, key, ca_cert, b64decode },
        } => {
            let path = ["tls", "verify"];
            let id = require(cli.container_id.as_deref(), "--container-id", &path);
            let cert_var = require(cert.as_deref(), "--cert and --key", &path);
            let key_var = require(key.as_deref(), "--cert and --key", &path);

            let opts = VerifyOptions {
                cert_var: cert_var.to_string(),
                key_var: key_var.to_string(),
                ca_var: ca_cert,
                b64decode,
            };
            let ins = DockerCli::new(&config.docker_bin);
            tls::run_verify(&ins, id, &opts, &mut out)
                .with_context(|| format!("verifying TLS material in {}", id))?;
        }

        Commands::Export {
            format,
            path_prefix,
            s3_bucket,
            s3_region,
            output_dir,
            snapshot,
            overwrite,
        } => {
            let config = config
                .with_output_dir(output_dir)
                .with_s3_bucket(s3_bucket)
                .with_s3_region(s3_region);

            let opts = ExportOptions {
                format,
                path_prefix,
                filter: ContainerFilter::from_arg(cli.container_id.as_deref()),
                snapshot,
                overwrite,
            };

            let store: Box<dyn ObjectStore> = match (&opts.format, &config.s3_bucket) {
                (ExportFormat::S3, Some(bucket)) => Box::new(
                    S3Store::new(bucket.clone(), config.s3_region.clone()).context("S3 client setup failed")?,
                ),
                _ => Box::new(DryRunStore),
            };

            let ins = DockerCli::new(&config.docker_bin);
            let summary = export::run_export(&ins, store.as_ref(), &config, &opts)
                .with_context(|| format!("export as {} failed", opts.format))?;
            log::info!(
                "Exported {} containers, {} files written",
                summary.containers,
                summary.written.len()
            );
        }
    }

    Ok(())
}

/// Returns the flag value, or prints usage for the subcommand and exits.
fn require<'a>(value: Option<&'a str>, flag: &str, path: &[&str]) -> &'a str {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            eprintln!("Must specify {}\n", flag);
            eprint!("{}", cli::subcommand_help(path));
            std::process::exit(USAGE_EXIT);
        }
    }
}
