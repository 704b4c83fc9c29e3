use std::fmt;
use std::io::Write;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use gerrit_filter::{
    AccountQuery, ChangeQuery, GroupQuery, ParseOptions, ProjectQuery, DEFAULT_MAX_DEPTH,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GERRIT_QUERY_LOG";

#[derive(Debug, Parser)]
#[command(name = "gerrit-query", version, about = "Normalize and check Gerrit search queries")]
pub struct Cli {
    /// Log parser decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep predicates the parser does not know instead of rejecting them
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Maximum nesting of groups and operators
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a query and print it in canonical form
    Normalize {
        #[arg(allow_hyphen_values = true)]
        query: String,
        #[arg(long, value_enum, default_value_t = Kind::Change)]
        kind: Kind,
    },
    /// Print the boolean structure of a change query
    Tree {
        #[arg(allow_hyphen_values = true)]
        query: String,
        /// Print JSON instead of an S-expression
        #[arg(long)]
        json: bool,
    },
    /// Check that every query parses; exits non-zero if any fails
    Check {
        #[arg(required = true, allow_hyphen_values = true)]
        queries: Vec<String>,
        #[arg(long, value_enum, default_value_t = Kind::Change)]
        kind: Kind,
    },
    /// Tell whether two change queries mean the same thing
    Equivalent {
        #[arg(allow_hyphen_values = true)]
        left: String,
        #[arg(allow_hyphen_values = true)]
        right: String,
    },
}

/// Which search grammar a query is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Change,
    Account,
    Group,
    Project,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Change => "change",
            Kind::Account => "account",
            Kind::Group => "group",
            Kind::Project => "project",
        })
    }
}

impl Cli {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict: !self.lenient,
            max_depth: self.max_depth,
        }
    }
}

/// Installs the stderr subscriber. `-v` wins over the environment.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected command, writing results to `out`.
///
/// Returns `false` when the command completed but its verdict is negative
/// (a query failed `check`, or `equivalent` found a difference).
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<bool> {
    let options = cli.parse_options();
    debug!(?options, command = ?cli.command, "running");

    match &cli.command {
        Command::Normalize { query, kind } => {
            let text = normalize(query, *kind, &options)?;
            writeln!(out, "{text}")?;
        }
        Command::Tree { query, json } => {
            let expr = parse_change(query, &options)?.to_expr();
            if *json {
                serde_json::to_writer_pretty(&mut *out, &expr)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{expr}")?;
            }
        }
        Command::Check { queries, kind } => {
            let mut failed = 0usize;
            for query in queries {
                match normalize(query, *kind, &options) {
                    Ok(_) => writeln!(out, "ok     {query}")?,
                    Err(err) => {
                        failed += 1;
                        writeln!(out, "error  {query}: {err:#}")?;
                    }
                }
            }
            if failed > 0 {
                warn!(failed, total = queries.len(), "queries rejected");
                return Ok(false);
            }
        }
        Command::Equivalent { left, right } => {
            let same = parse_change(left, &options)?.is_equivalent(&parse_change(right, &options)?);
            writeln!(out, "{}", if same { "equivalent" } else { "different" })?;
            return Ok(same);
        }
    }
    Ok(true)
}

fn parse_change(query: &str, options: &ParseOptions) -> anyhow::Result<ChangeQuery> {
    ChangeQuery::parse_with(query, options).with_context(|| format!("invalid change query {query:?}"))
}

fn normalize(query: &str, kind: Kind, options: &ParseOptions) -> anyhow::Result<String> {
    let text = match kind {
        Kind::Change => ChangeQuery::parse_with(query, options).map(|q| q.to_string()),
        Kind::Account => AccountQuery::parse_with(query, options).map(|q| q.to_string()),
        Kind::Group => GroupQuery::parse_with(query, options).map(|q| q.to_string()),
        Kind::Project => ProjectQuery::parse_with(query, options).map(|q| q.to_string()),
    };
    text.with_context(|| format!("invalid {kind} query {query:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> (bool, String) {
        let cli = Cli::try_parse_from(std::iter::once("gerrit-query").chain(args.iter().copied()))
            .unwrap();
        let mut out = Vec::new();
        let passed = run(&cli, &mut out).unwrap();
        (passed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn normalize_change_query() {
        let (passed, out) = run_args(&["normalize", "Owner:john status:open label:Code-Review+1"]);
        assert!(passed);
        assert_eq!(out, "owner:\"john\" is:open label:\"Code-Review=+1\"\n");
    }

    #[test]
    fn normalize_other_kinds() {
        let (_, out) = run_args(&["normalize", "--kind", "account", "-is:active email:a@b.c"]);
        assert_eq!(out, "is:inactive email:\"a@b.c\"\n");

        let (_, out) = run_args(&["normalize", "--kind", "project", "state:read_only"]);
        assert_eq!(out, "state:read-only\n");
    }

    #[test]
    fn normalize_reports_parse_errors() {
        let cli = Cli::try_parse_from(["gerrit-query", "normalize", "status:open2"]).unwrap();
        let err = run(&cli, &mut std::io::sink()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.starts_with("invalid change query \"status:open2\""));
        assert!(message.contains("unknown status 'open2'"));
    }

    #[test]
    fn lenient_flag_passes_unknown_predicates() {
        let (_, out) = run_args(&["--lenient", "normalize", "plugin:x"]);
        assert_eq!(out, "plugin:x\n");

        let cli = Cli::try_parse_from(["gerrit-query", "normalize", "plugin:x"]).unwrap();
        assert!(run(&cli, &mut std::io::sink()).is_err());
    }

    #[test]
    fn tree_as_s_expression_and_json() {
        let (_, out) = run_args(&["tree", "a b OR c"]);
        assert_eq!(out, "(or (and a b) c)\n");

        let (_, out) = run_args(&["tree", "--json", "-is:wip"]);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"not": {"term": "is:wip"}}));
    }

    #[test]
    fn check_reports_each_query() {
        let (passed, out) = run_args(&["check", "is:open", "AND"]);
        assert!(!passed);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ok     is:open");
        assert!(lines[1].starts_with("error  AND: invalid change query"));

        let (passed, _) = run_args(&["check", "is:open", "owner:self"]);
        assert!(passed);
    }

    #[test]
    fn equivalent_compares_meaning() {
        let (passed, out) = run_args(&["equivalent", "aaa status:open", "aaa AND (is:open)"]);
        assert!(passed);
        assert_eq!(out, "equivalent\n");

        let (passed, out) = run_args(&["equivalent", "a OR b c", "(a OR b) c"]);
        assert!(!passed);
        assert_eq!(out, "different\n");
    }

    #[test]
    fn max_depth_flag() {
        let cli = Cli::try_parse_from(["gerrit-query", "--max-depth", "1", "tree", "((a))"]).unwrap();
        assert_eq!(cli.parse_options().max_depth, 1);
        assert!(run(&cli, &mut std::io::sink()).is_err());
    }

    #[test]
    fn max_depth_defaults_to_library_default() {
        let cli = Cli::try_parse_from(["gerrit-query", "tree", "a"]).unwrap();
        assert_eq!(cli.parse_options(), ParseOptions::default());
    }

    #[test]
    fn check_requires_a_query() {
        assert!(Cli::try_parse_from(["gerrit-query", "check"]).is_err());
    }
}
