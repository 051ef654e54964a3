use clap::{CommandFactory, Parser, Subcommand};
use dockerenv::export::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockerenv")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Extract information from Docker container environment variables", long_about = None)]
pub struct Cli {
    /// The container to extract values from
    #[arg(short = 'c', long = "container-id", visible_alias = "id", global = true)]
    pub container_id: Option<String>,

    /// The variable name to extract values from
    #[arg(short = 'v', long = "var-name", visible_alias = "var", global = true)]
    pub var_name: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lists environment variables
    List,

    /// Returns a plain value suitable for scripting
    Get,

    /// Inspects PEM-encoded TLS certificates
    #[command(arg_required_else_help = true)]
    Tls {
        #[command(subcommand)]
        command: TlsCommands,
    },

    /// Exports the environment of one or all containers
    Export {
        /// Output format (env, yaml, json, ssm, s3)
        #[arg(long, default_value = "env")]
        format: ExportFormat,

        /// The SSM or S3 path prefix, starting with /
        #[arg(long, default_value = "/")]
        path_prefix: String,

        /// The S3 bucket name (no protocol)
        #[arg(long)]
        s3_bucket: Option<String>,

        /// The S3 region
        #[arg(long)]
        s3_region: Option<String>,

        /// Output directory for local formats
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also write the parameters needed to restart each container
        #[arg(long)]
        snapshot: bool,

        /// Replace existing files
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Subcommand)]
pub enum TlsCommands {
    /// Equivalent to 'openssl x509 -noout -text' for a cert+key held in variables
    Verify {
        /// The name of the environment var containing the cert
        #[arg(long)]
        cert: Option<String>,

        /// The name of the environment var containing the key
        #[arg(long)]
        key: Option<String>,

        /// The name of the environment var containing the CA cert
        #[arg(long)]
        ca_cert: Option<String>,

        /// Apply base64 decoding to the raw values
        #[arg(short = 'd', long, visible_alias = "b64")]
        b64decode: bool,
    },
}

/// Help text of the subcommand at `path`, e.g. `["tls", "verify"]`.
pub fn subcommand_help(path: &[&str]) -> String {
    let mut cmd = Cli::command();
    cmd.build();
    render_help(&mut cmd, path)
}

fn render_help(cmd: &mut clap::Command, path: &[&str]) -> String {
    match path.split_first() {
        Some((name, rest)) => match cmd.find_subcommand_mut(name) {
            Some(sub) => render_help(sub, rest),
            None => cmd.render_help().to_string(),
        },
        None => cmd.render_help().to_string(),
    }
}
