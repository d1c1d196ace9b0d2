use anyhow::Result;
use clap::Parser;

use queue_scouter::{Args, Collector, RuntimeConfig, logging, shutdown_signal};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_file.as_deref());

    let config = args.resolve_config()?;
    let runtime = RuntimeConfig::from_args(args.threads).build_runtime()?;

    runtime.block_on(async move {
        let collector = Collector::start(config).await?;
        collector.run_until(shutdown_signal()).await;
        Ok::<_, anyhow::Error>(())
    })
}
