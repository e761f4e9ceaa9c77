// Licensed under the Apache-2.0 license

//! `svd-lookup`: convert SVD files into a register database and query it.
//!
//! ```text
//! svd-lookup convert STM32F401.svd [out.db]   Build a store from an SVD file
//! svd-lookup list                             List peripherals
//! svd-lookup registers -p GPIOA               List a peripheral's registers
//! svd-lookup display -p GPIOA [-r MODER]      Registers, fields and masks
//! svd-lookup asm -p TIM_n [-r CR]             Assembler .equ directives
//! svd-lookup forth -p SPI1 [-a]               Forth constants
//! svd-lookup forth-regs -p SPI1 [-a]          Forth registers structure
//! svd-lookup dump                             Everything in the store
//! ```
//!
//! Query commands use the store given by `--database`, or else search for
//! `default-svd.db` starting at `--curdir` (or the working directory).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};
use svd_db::{
    convert, default_output_path, generate, report, Dialect, GenerateOptions, RegisterFilter,
    Store, StoreLocation,
};

#[derive(Parser, Debug)]
#[command(
    name = "svd-lookup",
    author,
    version,
    about = "Query a SVD register database",
    long_about = "Query a SVD register database in various ways.\n\n\
        Depending on the subcommand it generates assembler or Forth definitions \
        for a peripheral's registers, or displays the available peripherals and \
        registers in a human readable way."
)]
struct Cli {
    /// Verbose output: include descriptions and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory to start the search for default-svd.db from
    #[arg(
        short = 'c',
        long = "curdir",
        value_name = "DIR",
        global = true,
        conflicts_with = "database"
    )]
    curdir: Option<PathBuf>,

    /// Use the named database file
    #[arg(short = 'd', long = "database", value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Debug)]
struct PeripheralArgs {
    /// Peripheral to use (`%` and `_` wildcards allowed)
    #[arg(short, long)]
    peripheral: String,

    /// Register pattern to filter on
    #[arg(short, long, default_value = "")]
    register: String,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Convert a .svd file to a database file
    Convert {
        /// SVD file to read
        source: PathBuf,
        /// Database file to write (defaults to the source with a .db extension)
        output: Option<PathBuf>,
    },
    /// List the available peripherals
    #[command(visible_aliases = ["l", "lst"])]
    List,
    /// List the registers of a peripheral
    #[command(visible_aliases = ["r", "regs"])]
    Registers {
        /// Peripheral to use
        #[arg(short, long)]
        peripheral: String,
    },
    /// Display the registers and fields of a peripheral
    #[command(visible_aliases = ["d", "disp"])]
    Display(PeripheralArgs),
    /// Generate asm .equ directives defining registers and fields
    ///
    /// A peripheral ending in _n (e.g. TIM_n) emits the base address of
    /// every numbered peripheral in the family.
    Asm(PeripheralArgs),
    /// Generate Forth constants for registers and fields
    #[command(visible_alias = "fc")]
    Forth {
        #[command(flatten)]
        target: PeripheralArgs,
        /// Prepend the modify-reg support word
        #[arg(short = 'a', long = "addwords")]
        add_words: bool,
    },
    /// Generate a Forth registers structure for a peripheral
    #[command(visible_alias = "fr")]
    ForthRegs {
        #[command(flatten)]
        target: PeripheralArgs,
        /// Prepend the registers/reg/bit support words
        #[arg(short = 'a', long = "addwords")]
        add_words: bool,
    },
    /// Dump every peripheral, register and field
    Dump,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // Nothing useful can be done if a logger is already installed.
    let _ = SimpleLogger::new().with_level(level).env().init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Cmd::Convert { source, output } = &cli.command {
        if cli.curdir.is_some() || cli.database.is_some() {
            bail!("the -c and -d flags are ignored and should not be used with convert");
        }
        return cmd_convert(source, output.clone());
    }

    let path = store_location(&cli)?.locate()?;
    debug!("Using database {}", path.display());
    let store =
        Store::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;

    print!("{}", query(&store, cli.command, cli.verbose)?);
    Ok(())
}

fn query(store: &Store, command: Cmd, verbose: bool) -> Result<String> {
    Ok(match command {
        Cmd::Convert { .. } => bail!("convert does not read a database"),
        Cmd::List => report::list_peripherals(store, verbose)?,
        Cmd::Registers { peripheral } => report::list_registers(store, &peripheral, verbose)?,
        Cmd::Display(target) => report::display(
            store,
            &target.peripheral,
            &RegisterFilter::containing(&target.register),
            verbose,
        )?,
        Cmd::Asm(target) => cmd_generate(store, &target, Dialect::Assembler, false)?,
        Cmd::Forth { target, add_words } => {
            cmd_generate(store, &target, Dialect::ForthConstants, add_words)?
        }
        Cmd::ForthRegs { target, add_words } => {
            cmd_generate(store, &target, Dialect::ForthRegisters, add_words)?
        }
        Cmd::Dump => report::dump(store)?,
    })
}

fn store_location(cli: &Cli) -> Result<StoreLocation> {
    Ok(match (&cli.database, &cli.curdir) {
        (Some(database), _) => StoreLocation::Path(database.clone()),
        (None, Some(dir)) => StoreLocation::SearchFrom(dir.clone()),
        (None, None) => StoreLocation::SearchFrom(
            std::env::current_dir().context("Failed to get the current directory")?,
        ),
    })
}

fn cmd_convert(source: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| default_output_path(source));
    let existed = output.exists();

    match convert(source, &output) {
        Ok(summary) => {
            println!(
                "Wrote {}: {} peripherals, {} registers, {} fields",
                output.display(),
                summary.peripherals,
                summary.registers,
                summary.fields
            );
            Ok(())
        }
        Err(e) if !existed && output.exists() => Err(e).with_context(|| {
            format!(
                "Conversion of {} failed; {} is incomplete and should be deleted",
                source.display(),
                output.display()
            )
        }),
        Err(e) => Err(e).with_context(|| format!("Conversion of {} failed", source.display())),
    }
}

fn cmd_generate(
    store: &Store,
    target: &PeripheralArgs,
    dialect: Dialect,
    add_words: bool,
) -> Result<String> {
    let options = GenerateOptions::new()
        .register_filter(&target.register)
        .support_words(add_words);
    generate(store, &target.peripheral, dialect, &options)
        .with_context(|| format!("Failed to generate {dialect:?} for {}", target.peripheral))
}
