//! FeedQL CLI
//!
//! Command-line interface for validating and compiling FeedQL queries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feedql::{CompilerConfig, QueryCompiler, Tier};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "feedql")]
#[command(about = "FeedQL - validate, canonicalize and compile feed log queries", long_about = None)]
#[command(version)]
struct Cli {
    /// Compiler configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a query and report the first violated rule
    Validate {
        /// Query tier (ql0 or ql1)
        #[arg(short, long, default_value = "ql0")]
        tier: Tier,

        /// Query JSON; read from stdin when omitted or `-`
        query: Option<String>,
    },

    /// Best-effort parse; prints `null` when the query is unusable
    Parse {
        #[arg(short, long, default_value = "ql0")]
        tier: Tier,

        query: Option<String>,
    },

    /// Compile a query to its operator tree
    Compile {
        #[arg(short, long, default_value = "ql0")]
        tier: Tier,

        /// Let every predicate provision a dedicated index
        #[arg(long)]
        dedicated: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        query: Option<String>,
    },

    /// Print the canonical text form of a query
    Stringify {
        #[arg(short, long, default_value = "ql0")]
        tier: Tier,

        query: Option<String>,
    },

    /// Compare two queries structurally
    Equals {
        #[arg(short, long, default_value = "ql0")]
        tier: Tier,

        left: String,

        right: String,
    },

    /// Upgrade a legacy two-field QL0 query
    Migrate { query: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let config = load_config(cli.config.as_deref())?;
    let output = execute(cli.command, config)?;
    println!("{}", output);

    Ok(())
}

fn setup_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<CompilerConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading compiler config");
            CompilerConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(CompilerConfig::default()),
    }
}

/// Query text; stdin stands in for a missing argument
fn read_query(query: Option<String>) -> Result<String> {
    let text = match query.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read query from stdin")?;
            buf.trim().to_string()
        }
        Some(text) => text.to_string(),
    };
    Ok(text)
}

fn execute(command: Commands, mut config: CompilerConfig) -> Result<String> {
    match command {
        Commands::Validate { tier, query } => {
            let query = read_query(query)?;
            QueryCompiler::new(config).validate(tier, query)?;
            Ok(format!("{} query is valid", tier))
        }
        Commands::Parse { tier, query } => {
            let query = read_query(query)?;
            let parsed = QueryCompiler::new(config).parse(tier, query);
            Ok(serde_json::to_string_pretty(&parsed)?)
        }
        Commands::Compile {
            tier,
            dedicated,
            format,
            query,
        } => {
            let query = read_query(query)?;
            config.dedicated |= dedicated;
            let tree = QueryCompiler::new(config).compile(tier, query)?;
            match format {
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&tree)?),
                OutputFormat::Text => Ok(tree.to_string()),
            }
        }
        Commands::Stringify { tier, query } => {
            let query = read_query(query)?;
            Ok(QueryCompiler::new(config).stringify(tier, query)?)
        }
        Commands::Equals { tier, left, right } => {
            let equal = QueryCompiler::new(config).is_equals(tier, left, right)?;
            Ok(equal.to_string())
        }
        Commands::Migrate { query } => {
            let query = read_query(query)?;
            let migrated = QueryCompiler::new(config).ql0().migrate_legacy(query)?;
            Ok(migrated.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedql::FeedIdCheck;

    fn sigil_config() -> CompilerConfig {
        CompilerConfig {
            feed_id_check: FeedIdCheck::Sigil,
            ..Default::default()
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "feedql",
            "compile",
            "--tier",
            "ql1",
            "--dedicated",
            r#"{"op":"type","string":"vote"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Compile {
                tier, dedicated, ..
            } => {
                assert_eq!(tier, Tier::Ql1);
                assert!(dedicated);
            }
            _ => panic!("Expected compile command"),
        }

        assert!(Cli::try_parse_from(["feedql", "validate", "--tier", "ql9", "{}"]).is_err());
    }

    #[test]
    fn test_execute_compile_text() {
        let output = execute(
            Commands::Compile {
                tier: Tier::Ql0,
                dedicated: true,
                format: OutputFormat::Text,
                query: Some(r#"{"author":"@ABC=.ed25519","type":"vote","private":false}"#.to_string()),
            },
            sigil_config(),
        )
        .unwrap();
        assert_eq!(
            output,
            "and(author(@ABC=.ed25519, dedicated), type(vote, dedicated), isPublic())"
        );
    }

    #[test]
    fn test_execute_stringify() {
        let output = execute(
            Commands::Stringify {
                tier: Tier::Ql0,
                query: Some(r#"{"private":true,"type":null,"author":"@ABC=.ed25519"}"#.to_string()),
            },
            sigil_config(),
        )
        .unwrap();
        assert_eq!(output, r#"{"author":"@ABC=.ed25519","type":null,"private":true}"#);
    }

    #[test]
    fn test_execute_validate_failure() {
        let result = execute(
            Commands::Validate {
                tier: Tier::Ql1,
                query: Some(r#"{"op":"xor","args":[]}"#.to_string()),
            },
            sigil_config(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_execute_equals() {
        let output = execute(
            Commands::Equals {
                tier: Tier::Ql0,
                left: r#"{"author":"@a","type":"vote","private":false}"#.to_string(),
                right: r#"{"type":"vote","private":false,"author":"@a"}"#.to_string(),
            },
            sigil_config(),
        )
        .unwrap();
        assert_eq!(output, "true");

        let result = execute(
            Commands::Equals {
                tier: Tier::Ql1,
                left: r#"{"op":"type","string":"vote"}"#.to_string(),
                right: r#"{"op":"type","string":"vote"}"#.to_string(),
            },
            sigil_config(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_execute_migrate() {
        let output = execute(
            Commands::Migrate {
                query: Some(r#"{"author":"@a","type":"post"}"#.to_string()),
            },
            sigil_config(),
        )
        .unwrap();
        assert_eq!(output, r#"{"author":"@a","type":"post","private":false}"#);
    }

    #[test]
    fn test_parse_failure_prints_null() {
        let output = execute(
            Commands::Parse {
                tier: Tier::Ql0,
                query: Some("completenonsense".to_string()),
            },
            sigil_config(),
        )
        .unwrap();
        assert_eq!(output, "null");
    }
}
