use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deploy::Facet;
use tokenlist::{TokenListClient, DEFAULT_API_URL};

mod chain;
mod deploy;
mod error;
mod mappings;
mod ordered;
mod pipeline;
mod routers;
mod selectors;
mod tokenlist;

#[derive(Debug, Parser)]
#[command(name = "bridge-scripts", about = "Sync bridge configs and deploy facets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild `routers` of every chain from the bridge token lists.
    Routers {
        #[arg(long, default_value = "config/multichain.json")]
        config: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Rebuild `mappings` of every chain from the bridge token lists.
    Mappings {
        #[arg(long, default_value = "config/multichainTokens.json")]
        config: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Write the selectors of the custom errors in an ABI.
    Errors {
        #[arg(long, default_value = "diamondABI/diamond.json")]
        abi: PathBuf,
        #[arg(long, default_value = "errors/errorsTextAndHash.json")]
        out: PathBuf,
    },
    /// Deploy a compiled facet and print its address.
    Deploy(DeployArgs),
}

#[derive(Debug, clap::Args)]
struct ApiArgs {
    #[arg(long, env = "MULTICHAIN_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Debug, clap::Args)]
struct DeployArgs {
    #[arg(long, value_enum)]
    facet: Facet,
    /// Compiled artifact JSON holding the creation bytecode.
    #[arg(long)]
    artifact: PathBuf,
    #[arg(long, env = "ETH_NODE_URI")]
    rpc_url: String,
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    /// Network name used to look up constructor arguments.
    #[arg(long, default_value = "ethereum")]
    network: String,
    #[arg(long, default_value = "config/xy.json")]
    xy_config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Routers { config, api } => {
            let client = TokenListClient::new(api.api_url, reqwest::Client::new());
            let summary = routers::sync_routers(&client, &config).await?;
            report("routers", &summary);
        }
        Command::Mappings { config, api } => {
            let client = TokenListClient::new(api.api_url, reqwest::Client::new());
            let summary = mappings::sync_mappings(&client, &config).await?;
            report("mappings", &summary);
        }
        Command::Errors { abi, out } => {
            let raw = tokio::fs::read_to_string(&abi)
                .await
                .wrap_err_with(|| format!("failed to read {}", abi.display()))?;
            let parsed = selectors::parse_errors(&raw)?;
            selectors::write_selectors(&out, &parsed).await?;
            info!(errors = parsed.len(), "errors are parsed and written");
        }
        Command::Deploy(args) => run_deploy(args).await?,
    }

    Ok(())
}

fn report(what: &str, summary: &[pipeline::ChainSummary]) {
    for chain in summary {
        info!(chain = %chain.name, count = chain.count, "{what} updated");
    }
}

async fn run_deploy(args: DeployArgs) -> eyre::Result<()> {
    let constructor_args = args
        .facet
        .constructor_args(&args.network, &args.xy_config)
        .await?;
    let bytecode = deploy::load_bytecode(&args.artifact).await?;
    let init_code = deploy::init_code(&bytecode, &constructor_args)?;

    let address = deploy::deploy(&args.rpc_url, &args.private_key, init_code).await?;
    println!("{}", deploy::deployment_line(address, &constructor_args));

    Ok(())
}
