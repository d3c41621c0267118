mod config;
mod main_lib;
mod manifest;
mod output;
mod source;

use config::Config;
use main_lib::{init_tracing, run};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_format);

    let summary = run(&config)?;
    tracing::info!(
        "Wrote {} holdings for {} of {} funds to {}",
        summary.holdings,
        summary.succeeded,
        summary.funds,
        config.output_path.display()
    );
    Ok(())
}
