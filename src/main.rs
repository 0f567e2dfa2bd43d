use anyhow::Result;
use field_finder::cli::cli;

fn main() -> Result<()> {
    cli()
}
