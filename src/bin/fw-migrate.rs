//! fw-migrate CLI: vendor-agnostic firewall configuration migration tool.

use clap::Parser;
use fw_migrate::{Cli, run_with};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with(&cli)
}
