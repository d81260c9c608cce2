//! # mine
//!
//! **mine** keeps a catalog of your scripts under short names and runs them
//! through an interpreter chosen by file extension.
//!
//! - `mine add <file> <name> <description...>` registers a script
//! - `mine ls` lists registered scripts
//! - `mine exec <name>` runs one
//! - `mine -config [key [value]]` shows or edits settings
//!
//! State lives in `$(XDG_CONFIG_HOME)/mine/config.toml` unless
//! `-config-file` says otherwise. This CLI is built with
//! [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::process::ExitCode;

use mine::logger;
use mine::{AddRequest, ConfigCommand, ConfigStore, cmd_add, cmd_config, cmd_exec, cmd_list};

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "mine",
    version,
    about = "mine - run your scripts by name",
    arg_required_else_help = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Config file name or path
    #[arg(long = "config-file", value_name = "NAME|PATH")]
    config_file: Option<String>,

    /// Suppress everything except plain output
    #[arg(long)]
    silent: bool,

    /// Print the config, print one setting, or set one
    #[arg(long, num_args = 0..=2, value_names = ["KEY", "VALUE"], allow_hyphen_values = true)]
    config: Option<Vec<String>>,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Register a script under a name
    Add {
        /// Script file name (inside commands_folder) or path
        file: String,
        /// Name to run it by
        name: String,
        /// What it does
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        description: Vec<String>,
    },
    /// List registered scripts
    Ls,
    /// Run a registered script
    Exec {
        /// Registered name
        name: String,
    },
}

/// Rewrite Go-style single-dash long flags (`-config-file x`) to clap's
/// `--` form. Only the global flags before the subcommand are touched.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    const LONG_FLAGS: &[&str] = &["config-file", "config", "version", "silent"];

    let mut out = Vec::new();
    let mut iter = args.into_iter();
    if let Some(bin) = iter.next() {
        out.push(bin);
    }

    let mut takes_value = false;
    let mut passthrough = false;
    for arg in iter {
        if passthrough || takes_value {
            takes_value = false;
            out.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" || matches!(s, "add" | "ls" | "exec") {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let rewritten = s.strip_prefix('-').filter(|rest| !rest.starts_with('-')).and_then(|rest| {
            let name = rest.split_once('=').map_or(rest, |(n, _)| n);
            LONG_FLAGS.contains(&name).then(|| format!("-{s}"))
        });
        match rewritten {
            Some(long) => {
                takes_value = long == "--config-file";
                out.push(long.into());
            }
            None => {
                takes_value = s == "--config-file";
                out.push(arg);
            }
        }
    }
    out
}

/// `-config` is a mode of its own and cannot be mixed with a subcommand.
fn check_conflicts(cli: Cli) -> Result<Cli, clap::Error> {
    if cli.config.is_some() && cli.cmd.is_some() {
        return Err(Cli::command().error(
            clap::error::ErrorKind::ArgumentConflict,
            "cannot combine -config with other commands",
        ));
    }
    Ok(cli)
}

fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::locate(cli.config_file.as_deref())?;
    let mut cfg = store.load_or_init()?;

    if let Some(args) = cli.config {
        let cmd = ConfigCommand::from_args(&args)
            .ok_or_else(|| anyhow::anyhow!("-config takes at most two arguments"))?;
        return cmd_config(&store, &mut cfg, cmd);
    }

    match cli.cmd {
        Some(Cmd::Add {
            file,
            name,
            description,
        }) => cmd_add(
            &store,
            &mut cfg,
            &AddRequest {
                file,
                alias: name,
                description: description.join(" "),
            },
        ),
        Some(Cmd::Ls) => cmd_list(&cfg),
        Some(Cmd::Exec { name }) => cmd_exec(&cfg, &name),
        None => Ok(()),
    }
}

/// CLI entry point. Exits 2 on bad arguments (clap), 1 on failure.
fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let cli = check_conflicts(cli).unwrap_or_else(|e| e.exit());
    logger::set_silent(cli.silent);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            mine::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
