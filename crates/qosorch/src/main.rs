//! SONiC QoS daemon entry point.
//!
//! Builds the QoS engine over the simulation backend, brings up QoS on
//! the configured ports and optionally dumps the resulting graph.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use sonic_qosorch::audit::{init_logging, init_logging_pretty};
use sonic_qosorch::{NpuApiTable, PortOid, PortQosOrch, QosContext, QosSwitchConfig, VmQosNpu};

/// SONiC QoS orchestration daemon
#[derive(Parser, Debug)]
#[command(name = "qosorchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Switch capability file (JSON); built-in defaults when absent
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of front-panel ports to bring up
    #[arg(short = 'p', long, default_value = "32")]
    ports: u64,

    /// Object id of the CPU port
    #[arg(long, default_value = "0")]
    cpu_port: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long, conflicts_with = "plain_log")]
    json_log: bool,

    /// Use the plain env_logger output
    #[arg(long)]
    plain_log: bool,

    /// Print the QoS graph summary before exiting
    #[arg(long)]
    dump: bool,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => QosSwitchConfig::from_file(path)
            .with_context(|| format!("loading switch config {}", path.display()))?,
        None => QosSwitchConfig::default(),
    };
    info!(
        "Switch: {} UC / {} MC queues, {} PGs, {} hierarchy levels",
        config.max_uc_queues, config.max_mc_queues, config.num_pg, config.max_hierarchy_levels
    );

    let npu = NpuApiTable::from_backend(Arc::new(VmQosNpu::new(&config)));
    let ctx = QosContext::new(config, npu).context("initializing QoS context")?;
    let mut ports = PortQosOrch::new(ctx.clone());

    ports
        .port_init(PortOid::from_npu_id(args.cpu_port), true)
        .context("bringing up CPU port")?;
    for n in 1..=args.ports {
        let id = args.cpu_port + n;
        ports
            .port_init(PortOid::from_npu_id(id), false)
            .with_context(|| format!("bringing up port {}", id))?;
    }
    info!("QoS up on {} ports plus CPU port", args.ports);

    if args.dump {
        let summary = serde_json::to_string_pretty(&ctx.summary()).context("serializing summary")?;
        println!("{}", summary);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.plain_log {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
            .init();
    } else if args.json_log {
        init_logging(&args.log_level);
    } else {
        init_logging_pretty(&args.log_level);
    }

    info!("Starting SONiC qosorchd");
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("qosorchd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
