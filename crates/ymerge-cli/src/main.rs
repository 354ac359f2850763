use clap::Parser;

mod cli;
mod commands;
mod documents;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
    commands::run(cli)
}
