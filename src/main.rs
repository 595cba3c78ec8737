//! pkgenv CLI
//!
//! Asks an environment the questions a package manager would: USE flag
//! states, keyword and license acceptance, mask reasons and package sets.

mod repository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PackageAtom;
use package::environment::dispatch;
use package::{DefaultEnvironment, Environment, NoConfigEnvironment, PackageDatabaseEntry};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pkgenv", version, about, long_about = None)]
struct Cli {
    /// Use only the repository at ROOT, ignoring user configuration
    #[arg(long = "no-config", value_name = "ROOT", global = true, env = "PKGENV_NO_CONFIG")]
    no_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Is a USE flag enabled
    Use {
        flag: String,
        /// Package version, as category/name-version::repository
        pde: Option<String>,
    },
    /// Is a keyword accepted
    Keyword {
        keyword: String,
        pde: Option<String>,
    },
    /// Is a license accepted
    License {
        license: String,
        pde: Option<String>,
    },
    /// Why a package version is masked
    Masks { pde: String },
    /// Expand a package set
    Set {
        name: String,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// List package versions matching an atom, with their mask reasons
    Query { atom: String },
    /// List repositories in priority order
    Repos,
    /// Call an environment method with JSON arguments
    Call {
        /// One of query_use, accept_keyword, accept_license, mask_reasons,
        /// package_set or fetch_repository
        method: String,
        /// Arguments as JSON; anything else is taken as a string
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Run a command; `Ok(false)` means the answer was "no"
fn run(cli: Cli) -> Result<bool> {
    let no_config;
    let env: &dyn Environment = match &cli.no_config {
        Some(root) => {
            let root = repository::validate_repository(root)?;
            no_config = NoConfigEnvironment::new(root)?;
            &no_config
        }
        None => {
            debug!(
                "Using configuration from {}",
                config::ConfigLoader::from_env().root().display()
            );
            DefaultEnvironment::instance().context("Failed to load the default environment")?
        }
    };

    match cli.command {
        Commands::Use { flag, pde } => answer(env.query_use(&flag, parse_pde(pde)?.as_ref())?),
        Commands::Keyword { keyword, pde } => {
            answer(env.accept_keyword(&keyword, parse_pde(pde)?.as_ref())?)
        }
        Commands::License { license, pde } => {
            answer(env.accept_license(&license, parse_pde(pde)?.as_ref())?)
        }
        Commands::Masks { pde } => {
            let pde = PackageDatabaseEntry::parse(&pde)?;
            let reasons = env.mask_reasons(&pde)?;
            for reason in reasons.iter() {
                println!("{}", reason);
            }
            Ok(reasons.is_empty())
        }
        Commands::Set { name, json } => {
            let tree = env.package_set(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                for atom in tree.leaves() {
                    println!("{}", atom);
                }
            }
            Ok(true)
        }
        Commands::Query { atom } => {
            let atom: PackageAtom = atom.parse()?;
            let matches = env.package_database().query(&atom);
            for pde in &matches {
                let reasons = env.mask_reasons(pde)?;
                if reasons.is_empty() {
                    println!("{}", pde);
                } else {
                    println!("{} masked by {}", pde, reasons);
                }
            }
            Ok(!matches.is_empty())
        }
        Commands::Repos => {
            for repo in env.package_database().repositories() {
                match repo.location() {
                    Some(location) => println!("{} {}", repo.name(), location.display()),
                    None => println!("{}", repo.name()),
                }
            }
            Ok(true)
        }
        Commands::Call { method, args } => {
            let args = args
                .iter()
                .map(|arg| parse_json_arg(arg))
                .collect::<Result<Vec<_>>>()?;
            let value = dispatch::call(env, &method, &args)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(value != serde_json::Value::Bool(false))
        }
    }
}

fn answer(yes: bool) -> Result<bool> {
    println!("{}", if yes { "yes" } else { "no" });
    Ok(yes)
}

fn parse_pde(pde: Option<String>) -> Result<Option<PackageDatabaseEntry>> {
    pde.map(|s| {
        PackageDatabaseEntry::parse(&s).with_context(|| format!("Invalid package version: {}", s))
    })
    .transpose()
}

/// Arguments that are not valid JSON are taken as plain strings
fn parse_json_arg(arg: &str) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(arg).unwrap_or_else(|_| serde_json::Value::String(arg.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["pkgenv", "--no-config", "/repo", "use", "doc", "foo/bar-1.0::r"])
            .unwrap();
        assert_eq!(cli.no_config, Some(PathBuf::from("/repo")));
        assert!(matches!(cli.command, Commands::Use { ref flag, pde: Some(_) } if flag == "doc"));

        let cli = Cli::try_parse_from(["pkgenv", "-vv", "set", "@world", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Set { json: true, .. }));

        let cli = Cli::try_parse_from(["pkgenv", "call", "query_use", "doc", "{}"]).unwrap();
        assert!(matches!(cli.command, Commands::Call { ref args, .. } if args.len() == 2));
    }

    #[test]
    fn test_json_args() {
        assert_eq!(parse_json_arg("42").unwrap(), serde_json::json!(42));
        assert_eq!(parse_json_arg("test").unwrap(), serde_json::json!("test"));
        assert_eq!(parse_json_arg("\"~test\"").unwrap(), serde_json::json!("~test"));
    }

    #[test]
    fn test_no_config_run() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("foo/bar")).unwrap();
        std::fs::create_dir_all(dir.path().join("profiles")).unwrap();
        std::fs::write(dir.path().join("profiles/repo_name"), "testrepo\n").unwrap();
        std::fs::write(dir.path().join("profiles/make.defaults"), "ARCH=\"test\"\n").unwrap();
        std::fs::write(dir.path().join("foo/bar/bar-1.0.ebuild"), "KEYWORDS=\"~test\"\n").unwrap();

        let root = dir.path().to_str().unwrap();
        assert!(run_in(root, &["keyword", "test"]).unwrap());
        assert!(!run_in(root, &["masks", "foo/bar-1.0::testrepo"]).unwrap());
        assert!(run_in(root, &["set", "everything"]).unwrap());
        assert!(run_in(root, &["query", "foo/bar"]).unwrap());
        assert!(!run_in(root, &["query", "foo/baz"]).unwrap());
        assert!(run_in(root, &["call", "fetch_repository", "testrepo"]).unwrap());
        assert!(run_in(root, &["masks", "foo/bar-1.0::nosuchrepo"]).is_err());
        assert!(run_in(root, &["call", "new"]).is_err());
    }

    fn run_in(root: &str, args: &[&str]) -> Result<bool> {
        let mut argv = vec!["pkgenv", "--no-config", root];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv)?)
    }
}
