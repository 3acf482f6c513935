use std::io::{self, Write};

use anyhow::Context;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new("fluxrun=warn,fluxrun_core=warn"))
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    fluxrun::execute_workflow(&mut out)
        .with_context(|| format!("Workflow on the {} model failed", fluxrun::TEST_MODEL))?;
    out.flush().context("Unable to flush stdout")?;
    Ok(())
}
