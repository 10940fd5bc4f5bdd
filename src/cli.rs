//! Minimal CLI: check a change against a declared type.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::change::{Action, Change};
use crate::error::ChangeError;
use crate::path::{Path, PathSet};
use crate::ty::Ty;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate planned changes against a declared type
#[derive(Parser, Debug)]
#[command(name = "json-change", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build a change from old/new documents and report whether it is valid
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct CheckArgs {
    /// declared type, in its JSON encoding (e.g. ["object", {"name": "string"}])
    #[arg(long = "type", short = 't')]
    type_file: PathBuf,

    /// one of create, read, update, replace, delete
    #[arg(long, short)]
    action: Action,

    /// document with the value before the action
    #[arg(long)]
    old: Option<PathBuf>,

    /// document with the value after the action
    #[arg(long)]
    new: Option<PathBuf>,

    /// JSON Pointer of a location that forced replacement (replace only; repeatable)
    #[arg(long)]
    forced: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Run the selected command. `Ok(false)` means the input was rejected and
    /// the process should exit non-zero.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(args) => args.run(),
        }
    }
}

impl CheckArgs {
    fn run(&self) -> Result<bool> {
        self.reject_unused_flags()?;

        let ty: Ty = crate::path_de::read_json_file(&self.type_file)?;
        tracing::debug!(%ty, action = %self.action, "loaded declared type");

        let built = match self.action {
            Action::Create => Change::create(ty, self.value(&self.new, "--new")?),
            Action::Read => Change::read(ty, self.value(&self.new, "--new")?),
            Action::Update => {
                let old = self.value(&self.old, "--old")?;
                Change::update(ty, old, self.value(&self.new, "--new")?)
            }
            Action::Replace => {
                let forced = self.forced_paths(&ty)?;
                let old = self.value(&self.old, "--old")?;
                Change::replace(ty, old, self.value(&self.new, "--new")?, forced)
            }
            Action::Delete => Change::delete(ty, self.value(&self.old, "--old")?),
        };

        match built {
            Ok(change) => {
                println!("{} {}", "ok:".green().bold(), summary(&change));
                Ok(true)
            }
            Err(err @ ChangeError::Conformance { .. }) => {
                eprintln!("{} {}", "rejected:".red().bold(), err);
                for violation in err.conformance_errors() {
                    eprintln!("  {} {}", "-".red(), violation);
                }
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Flags the action has no slot for are an error, not silently dropped.
    fn reject_unused_flags(&self) -> Result<()> {
        let (takes_old, takes_new) = match self.action {
            Action::Create | Action::Read => (false, true),
            Action::Update | Action::Replace => (true, true),
            Action::Delete => (true, false),
        };
        if !takes_old && self.old.is_some() {
            bail!("--old does not apply to {}, which starts from null", self.action);
        }
        if !takes_new && self.new.is_some() {
            bail!("--new does not apply to {}, which ends at null", self.action);
        }
        if self.action != Action::Replace && !self.forced.is_empty() {
            bail!("--forced only applies to replace, not {}", self.action);
        }
        Ok(())
    }

    fn value(&self, file: &Option<PathBuf>, flag: &str) -> Result<Value> {
        let Some(file) = file else {
            bail!("{flag} is required for {}", self.action);
        };
        let json: serde_json::Value = crate::path_de::read_json_file(file)?;
        Ok(Value::from(json))
    }

    fn forced_paths(&self, ty: &Ty) -> Result<PathSet> {
        self.forced.iter()
            .map(|p| Path::from_pointer(p, ty).with_context(|| format!("invalid --forced {p:?}")))
            .collect()
    }
}

fn summary(change: &Change) -> String {
    match change.forced_replace() {
        Ok(forced) => {
            let noun = if forced.len() == 1 { "path" } else { "paths" };
            let listed: Vec<String> = forced.iter().map(ToString::to_string).collect();
            if listed.is_empty() {
                format!("{} ({} forced {noun})", change.action(), forced.len())
            } else {
                format!("{} ({} forced {noun}: {})", change.action(), forced.len(), listed.join(", "))
            }
        }
        Err(_) => change.action().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "json-change", "check", "--type", "t.json", "--action", "replace",
            "--old", "a.json", "--new", "b.json", "--forced", "/name", "--forced", "/size",
        ]).unwrap();
        let Command::Check(args) = cli.cmd;
        assert_eq!(args.action, Action::Replace);
        assert_eq!(args.forced, ["/name", "/size"]);
    }

    #[test]
    fn rejects_unknown_actions() {
        let res = CommandLineInterface::try_parse_from([
            "json-change", "check", "--type", "t.json", "--action", "destroy",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn summary_lists_forced_paths() {
        let ty = Ty::object([("name", Ty::String), ("size", Ty::Integer)]);
        let v = |name: &str| Value::from(serde_json::json!({"name": name, "size": 1}));
        let forced = PathSet::from_paths([Path::root().attr("name")]);
        let c = Change::replace(ty.clone(), v("a"), v("b"), forced).unwrap();
        assert_eq!(summary(&c), "replace (1 forced path: .name)");
        let c = Change::update(ty, v("a"), v("b")).unwrap();
        assert_eq!(summary(&c), "update");
    }

    fn check_args(args: &[&str]) -> CheckArgs {
        let argv = ["json-change", "check", "--type", "t.json"].iter().chain(args).copied();
        let Command::Check(args) = CommandLineInterface::try_parse_from(argv).unwrap().cmd;
        args
    }

    #[test]
    fn flags_outside_the_action_are_rejected() {
        let err = check_args(&["-a", "create", "--old", "a.json", "--new", "b.json"])
            .reject_unused_flags().unwrap_err();
        assert_eq!(err.to_string(), "--old does not apply to create, which starts from null");
        assert!(check_args(&["-a", "read", "--old", "a.json"]).reject_unused_flags().is_err());

        let err = check_args(&["-a", "delete", "--old", "a.json", "--new", "b.json"])
            .reject_unused_flags().unwrap_err();
        assert_eq!(err.to_string(), "--new does not apply to delete, which ends at null");

        let err = check_args(&["-a", "update", "--old", "a.json", "--new", "b.json", "--forced", "/name"])
            .reject_unused_flags().unwrap_err();
        assert_eq!(err.to_string(), "--forced only applies to replace, not update");
    }

    #[test]
    fn flags_the_action_uses_are_accepted() {
        assert!(check_args(&["-a", "create", "--new", "b.json"]).reject_unused_flags().is_ok());
        assert!(check_args(&["-a", "read", "--new", "b.json"]).reject_unused_flags().is_ok());
        assert!(check_args(&["-a", "update", "--old", "a.json", "--new", "b.json"]).reject_unused_flags().is_ok());
        assert!(check_args(&["-a", "delete", "--old", "a.json"]).reject_unused_flags().is_ok());
        let replace = check_args(&["-a", "replace", "--old", "a.json", "--new", "b.json", "--forced", "/name"]);
        assert!(replace.reject_unused_flags().is_ok());
    }
}
