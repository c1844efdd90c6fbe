use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use counter_dapp::{
    counter_address, App, ClientConfig, Cluster, Command, Commitment, KeypairWallet,
    ProgramInterface, RpcTransport, Wallet, DEFAULT_STEP,
};
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, global = true, help = "TOML configuration file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Cluster to connect to")]
    cluster: Option<Cluster>,

    #[arg(long, global = true, help = "RPC URL, overrides --cluster")]
    url: Option<String>,

    #[arg(long, global = true, value_enum, help = "Commitment for queries and confirmation")]
    commitment: Option<Commitment>,

    #[arg(long, global = true, help = "Path to the wallet keypair file")]
    keypair: Option<PathBuf>,

    #[arg(long, global = true, help = "Program interface descriptor (Anchor IDL JSON)")]
    idl: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Skip preflight when increasing [default: true]"
    )]
    skip_preflight_increment: Option<bool>,

    #[arg(
        long,
        global = true,
        help = "Skip preflight when decreasing [default: false]"
    )]
    skip_preflight_decrement: Option<bool>,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Show balance and counter value
    Status,
    /// Increase the counter
    Increment {
        #[arg(long, default_value_t = DEFAULT_STEP)]
        step: u64,
    },
    /// Decrease the counter
    Decrement {
        #[arg(long, default_value_t = DEFAULT_STEP)]
        step: u64,
    },
    /// Print the derived counter address of the wallet
    Address,
    /// Interactive session reading commands from stdin
    Interactive,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())
            .context("failed to load client configuration")?;

        if let Some(cluster) = self.cluster {
            config.cluster = cluster;
        }
        if let Some(url) = &self.url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(commitment) = self.commitment {
            config.commitment = commitment;
        }
        if let Some(keypair) = &self.keypair {
            config.keypair_path = keypair.clone();
        }
        if let Some(idl) = &self.idl {
            config.idl_path = Some(idl.clone());
        }
        if let Some(skip) = self.skip_preflight_increment {
            config.preflight.increment_skip_preflight = skip;
        }
        if let Some(skip) = self.skip_preflight_decrement {
            config.preflight.decrement_skip_preflight = skip;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    let interface = match &config.idl_path {
        Some(path) => ProgramInterface::load(path)?,
        None => ProgramInterface::embedded()?,
    };
    interface
        .validate()
        .context("program interface does not describe the counter program")?;

    let transport = Arc::new(RpcTransport::new(&config));
    let wallet = Arc::new(KeypairWallet::new(config.keypair_path.clone()));

    if let Some(Action::Address) = cli.command {
        let authority = wallet.connect().await?;
        let (address, bump) = counter_address(&interface.program_id(), &authority);
        println!("{address} (bump {bump})");
        return Ok(ExitCode::SUCCESS);
    }

    let mut app = App::new(config, interface, transport, wallet);

    let command = match cli.command.unwrap_or(Action::Interactive) {
        Action::Interactive => {
            let _ = app.start().await;
            app.run_interactive(BufReader::new(stdin()), stdout())
                .await?;
            return Ok(ExitCode::SUCCESS);
        }
        Action::Status | Action::Address => None,
        Action::Increment { step } => Some(Command::Increment(step)),
        Action::Decrement { step } => Some(Command::Decrement(step)),
    };

    if app.connect().await.is_err() {
        print!("{}", app.render().await);
        return Ok(ExitCode::FAILURE);
    }

    let outcome = match command {
        Some(command) => app.execute(command).await.map(|_| ()),
        None => Ok(()),
    };
    print!("{}", app.render().await);

    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    })
}
