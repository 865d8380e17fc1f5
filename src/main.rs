use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use slicemap::mapper::{default_table, MappingContext};
use slicemap::profile::reader::read_printer_settings;
use slicemap::profile::{PrinterSettings, ProfilePaths};

#[derive(Debug, Parser)]
#[command(name = "slicemap", version, about = "Resolve printer settings and render G-code templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Substitute {name} / [name] placeholders in a template file
    Render {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Template file to render
        template: PathBuf,
    },
    /// Print every setting handed to the slicing engine
    Export {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Print the effective raw value of one setting
    Get {
        /// Profile path or name
        profile: String,
        /// Setting key
        key: String,
    },
}

#[derive(Debug, Args)]
struct ProfileArgs {
    /// Profile path or name (looked up in the profile directory)
    profile: String,
    /// Which extruders the print uses, e.g. 1,0,1
    #[arg(long, value_delimiter = ',', default_value = "1")]
    extruders: Vec<u8>,
}

impl ProfileArgs {
    fn extruders_used(&self) -> Vec<bool> {
        self.extruders.iter().map(|&flag| flag != 0).collect()
    }
}

fn main() -> ExitCode {
    slicemap::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render { profile, template } => {
            let settings = load_profile(&profile.profile)?;
            let text = std::fs::read_to_string(&template)
                .with_context(|| format!("Failed to read template {:?}", template))?;

            let cascade = settings.cascade();
            let extruders_used = profile.extruders_used();
            let ctx = MappingContext::new(&cascade, &extruders_used);
            print!("{}", default_table().replace_macro_values(&text, &ctx));
        }
        Command::Export { profile } => {
            let settings = load_profile(&profile.profile)?;
            let cascade = settings.cascade();
            let extruders_used = profile.extruders_used();
            let ctx = MappingContext::new(&cascade, &extruders_used);
            for (name, value) in default_table().export_settings(&ctx) {
                println!("{} = {}", name, value.replace('\n', "\\n"));
            }
        }
        Command::Get { profile, key } => {
            let settings = load_profile(&profile)?;
            println!("{}", settings.value(&key));
        }
    }
    Ok(())
}

fn load_profile(arg: &str) -> Result<PrinterSettings> {
    let paths = ProfilePaths::detect()?;
    let path = paths.resolve_profile(arg);
    debug!("Loading profile {:?}", path);
    read_printer_settings(&path)
}
