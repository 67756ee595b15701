use anyhow::Context as _;
use bf_tape::{BfInterpreter, Config, programs};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let stdin = stdin.lock();
    let stdout = std::io::stdout();
    let interpreter = BfInterpreter::new(programs::REVERSER, Config::default(), stdin, stdout)
        .context("program rejected")?;
    interpreter.execute().context("execution failure")?;
    Ok(())
}
