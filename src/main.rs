use stagehand::cli;

fn main() -> anyhow::Result<()> {
    cli::run_cli()
}
