//! nandflasher - A raw NAND flash programmer
//!
//! Drives ONFI NAND chips through a byte-wide bus adapter: identifies the
//! chip, reads and writes pages with their spare area, erases blocks,
//! scans for bad blocks and manipulates feature registers.
//!
//! # Architecture
//!
//! The protocol engine lives in `nandflasher-core` and talks to the chip
//! through the `NandBus` trait. `nandflasher-flash` opens a transport by
//! name and hands the CLI an identified `NandHandle`, so the command
//! implementations never see which adapter is in use.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, FeatureCommands};
use nandflasher_core::NandConfig;
use nandflasher_flash::open_nand;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = nand_config(&cli);

    let result = match cli.command {
        Commands::Info => {
            let mut handle = open_nand(&cli.programmer, config)?;
            commands::print_chip_info(&mut handle)
        }
        Commands::Read {
            output,
            page,
            start_page,
            end_page,
            no_oob,
            sequential,
            raw,
            hex,
        } => {
            let mut handle = open_nand(&cli.programmer, config)?;
            let (start, end) = match page {
                Some(page) => (Some(page), Some(page)),
                None => (start_page, end_page),
            };
            let opts = commands::ReadArgs {
                start,
                end,
                include_oob: !no_oob,
                raw,
                hex,
            };
            if sequential {
                commands::run_read_sequential(&mut handle, &output, &opts)
            } else {
                commands::run_read(&mut handle, &output, &opts)
            }
        }
        Commands::Write {
            input,
            offset,
            start_page,
            end_page,
            add_oob,
            jffs2,
            raw,
        } => {
            let mut handle = open_nand(&cli.programmer, config)?;
            let opts = commands::WriteArgs {
                offset: offset as usize,
                start_page,
                end_page,
                add_oob,
                jffs2,
                raw,
            };
            commands::run_write(&mut handle, &input, &opts)
        }
        Commands::Erase {
            start_block,
            end_block,
        } => {
            let mut handle = open_nand(&cli.programmer, config)?;
            commands::run_erase(&mut handle, start_block, end_block)
        }
        Commands::BadBlocks => {
            let mut handle = open_nand(&cli.programmer, config)?;
            commands::run_bad_blocks(&mut handle)
        }
        Commands::Features(subcmd) => {
            let mut handle = open_nand(&cli.programmer, config)?;
            match subcmd {
                FeatureCommands::Get { address } => commands::cmd_get(&mut handle, address),
                FeatureCommands::Set { address, values } => {
                    commands::cmd_set(&mut handle, address, &values)
                }
            }
        }
        Commands::CellMode { slc_block, mlc } => {
            let mut handle = open_nand(&cli.programmer, config)?;
            commands::cmd_cell_mode(&mut handle, slc_block, mlc)
        }
        Commands::Ber { a, b } => commands::run_ber(&a, &b),
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Engine settings from the global flags
fn nand_config(cli: &Cli) -> NandConfig {
    let mut config = NandConfig::default();
    if let Some(ms) = cli.ready_timeout_ms {
        config = config.with_ready_timeout_us(ms.saturating_mul(1000));
    }
    if let Some(retries) = cli.program_retries {
        config = config.with_program_retries(retries);
    }
    config
}
