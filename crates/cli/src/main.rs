use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use reflect_core::logging::{self, LoggingConfig};
use reflect_core::paths::absolute_path;
use reflect_core::{
    AutoMemoryTopic, CONFIG_FILE, ClaudeHome, Config, Discovery, FileDescriptor, LearningType, MemoryEntry, Route,
    read_all_memory_entries, read_auto_memory, route_learning, suggest_auto_memory_topic,
};
use std::path::{Path, PathBuf};

/// Reflect - memory file discovery and learning routing
#[derive(Parser, Debug)]
#[command(name = "reflect")]
#[command(about = "Discover CLAUDE.md memory tiers and route learnings to them", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to reflect.toml (default: ./reflect.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// User config directory (default: $REFLECT_CLAUDE_DIR or ~/.claude)
    #[arg(long, value_name = "DIR", global = true)]
    claude_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every memory and rule file visible to a project
    Discover {
        /// Project root (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Suggest the memory file a learning belongs in
    Route {
        /// Learning text
        #[arg(required = true, value_name = "TEXT")]
        text: String,

        /// Learning type: guardrail, correction or preference
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        learning_type: Option<LearningType>,

        /// Project root (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Suggest the auto-memory topic for a learning
    Topic {
        /// Learning text
        #[arg(required = true, value_name = "TEXT")]
        text: String,
    },
    /// Print every memory entry visible to a project
    Entries {
        /// Project root (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Print the auto-memory topics of a project
    AutoMemory {
        /// Project root (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum, value_name = "SHELL")]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let claude_dir = cli.claude_dir.as_deref();
    let log_setup = logging_config(&config, claude_dir, cli.verbose);
    let _guard = logging::init_logging(Some(log_setup)).context("Failed to initialize logging")?;

    tracing::debug!("Using config: {}", logging::sanitize_path(&config_path));

    let output = match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "reflect", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Discover { dir } => cmd_discover(&discoverer(claude_dir, &config)?, &project_root(dir)?, cli.json)?,
        Commands::Route { text, learning_type, dir } => cmd_route(
            &discoverer(claude_dir, &config)?,
            &project_root(dir)?,
            &text,
            learning_type,
            cli.json,
        )?,
        Commands::Topic { text } => cmd_topic(&text, cli.json)?,
        Commands::Entries { dir } => cmd_entries(&discoverer(claude_dir, &config)?, &project_root(dir)?, cli.json)?,
        Commands::AutoMemory { dir } => {
            cmd_auto_memory(&discoverer(claude_dir, &config)?, &project_root(dir)?, cli.json)?
        }
    };

    print!("{}", output);
    Ok(())
}

/// Resolve the user config directory; `--claude-dir` wins over the config file and environment
fn claude_home(claude_dir: Option<&Path>, config: &Config) -> Result<ClaudeHome> {
    match claude_dir {
        Some(dir) => Ok(ClaudeHome::new(absolute_path(dir))),
        None => config.claude_home().context("Failed to locate the user config directory"),
    }
}

/// Build the logging setup; the log file lives under the resolved user config directory
fn logging_config(config: &Config, claude_dir: Option<&Path>, verbose: bool) -> LoggingConfig {
    let mut logging_config = LoggingConfig::from(config.logging.clone());
    if verbose {
        logging_config = logging_config.with_level("debug");
    }
    if let Ok(home) = claude_home(claude_dir, config) {
        logging_config = logging_config.with_log_dir(home.logs_dir());
    }
    logging_config
}

fn discoverer(claude_dir: Option<&Path>, config: &Config) -> Result<Discovery> {
    Ok(Discovery::from_config(claude_home(claude_dir, config)?, config))
}

/// Resolve the project root argument to an absolute path
fn project_root(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    anyhow::ensure!(dir.is_dir(), "Project directory not found: {}", dir.display());
    Ok(absolute_path(&dir))
}

/// List discovered files
fn cmd_discover(discovery: &Discovery, root: &Path, json: bool) -> Result<String> {
    let files = discovery.find_claude_files(root);
    if json {
        return Ok(serde_json::to_string_pretty(&files)? + "\n");
    }
    Ok(render_files(&files))
}

fn render_files(files: &[FileDescriptor]) -> String {
    if files.is_empty() {
        return format!("{} No memory files found\n", "Info:".yellow().bold());
    }

    let mut out = String::new();
    for file in files {
        out.push_str(&format!("{:<14} {}", file.file_type.as_str().cyan(), file.relative_path));
        let scope = file.scoped_paths();
        if !scope.is_empty() {
            out.push_str(&format!(" {}", format!("[paths: {}]", scope.join(", ")).dimmed()));
        }
        out.push('\n');
    }
    out
}

/// Route a learning against the project's inventory
fn cmd_route(
    discovery: &Discovery, root: &Path, text: &str, learning_type: Option<LearningType>, json: bool,
) -> Result<String> {
    let files = discovery.find_claude_files(root);
    let route = route_learning(text, &files, learning_type);
    let topic = suggest_auto_memory_topic(text);

    if json {
        let value = serde_json::json!({ "route": route, "topic": topic });
        return Ok(serde_json::to_string_pretty(&value)? + "\n");
    }
    Ok(render_route(route.as_ref(), topic))
}

fn render_route(route: Option<&Route>, topic: &str) -> String {
    match route {
        Some(route) => format!(
            "{} {} ({}, confidence {:.1})\n",
            "Route:".green().bold(),
            route.path.cyan(),
            route.reason,
            route.confidence
        ),
        None => format!(
            "{} No confident destination; suggested auto-memory topic: {}\n",
            "Info:".yellow().bold(),
            topic.cyan()
        ),
    }
}

/// Suggest an auto-memory topic
fn cmd_topic(text: &str, json: bool) -> Result<String> {
    let topic = suggest_auto_memory_topic(text);
    if json {
        return Ok(serde_json::to_string(&serde_json::json!({ "topic": topic }))? + "\n");
    }
    Ok(format!("{}\n", topic))
}

/// Print all memory entries
fn cmd_entries(discovery: &Discovery, root: &Path, json: bool) -> Result<String> {
    let entries = read_all_memory_entries(discovery, root);
    if json {
        return Ok(serde_json::to_string_pretty(&entries)? + "\n");
    }
    Ok(render_entries(&entries))
}

fn render_entries(entries: &[MemoryEntry]) -> String {
    if entries.is_empty() {
        return format!("{} No memory entries found\n", "Info:".yellow().bold());
    }

    entries
        .iter()
        .map(|e| format!("[{}] {} {}\n", e.source_type.cyan(), e.text, format!("({})", e.source_file).dimmed()))
        .collect()
}

/// Print auto-memory topics with entry counts
fn cmd_auto_memory(discovery: &Discovery, root: &Path, json: bool) -> Result<String> {
    let topics = read_auto_memory(discovery.home(), Some(root));
    if json {
        return Ok(serde_json::to_string_pretty(&topics)? + "\n");
    }
    Ok(render_topics(&topics))
}

fn render_topics(topics: &[AutoMemoryTopic]) -> String {
    if topics.is_empty() {
        return format!("{} No auto-memory topics found\n", "Info:".yellow().bold());
    }

    topics
        .iter()
        .map(|t| format!("{:<20} {} entries\n", t.name.cyan(), t.entries.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Discovery, PathBuf) {
        let temp = TempDir::new().unwrap();
        let claude = temp.path().join("claude");
        let project = temp.path().join("project");
        fs::create_dir_all(&claude).unwrap();
        fs::create_dir_all(&project).unwrap();
        (temp, Discovery::new(ClaudeHome::new(claude)), project)
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["reflect", "discover"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.claude_dir.is_none());
        assert!(!cli.verbose);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["reflect", "entries", "--json", "--claude-dir", "/tmp/claude"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.claude_dir, Some(PathBuf::from("/tmp/claude")));
    }

    #[test]
    fn test_cli_route_command() {
        let cli = Cli::try_parse_from(["reflect", "route", "Never commit secrets", "--type", "guardrail"]).unwrap();
        if let Commands::Route { text, learning_type, dir } = cli.command {
            assert_eq!(text, "Never commit secrets");
            assert_eq!(learning_type, Some(LearningType::Guardrail));
            assert!(dir.is_none());
        } else {
            panic!("Expected Route command");
        }
    }

    #[test]
    fn test_cli_route_invalid_type() {
        assert!(Cli::try_parse_from(["reflect", "route", "text", "--type", "hunch"]).is_err());
    }

    #[test]
    fn test_cli_route_requires_text() {
        assert!(Cli::try_parse_from(["reflect", "route"]).is_err());
    }

    #[test]
    fn test_cli_completions_command() {
        let cli = Cli::try_parse_from(["reflect", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Bash }));
    }

    #[test]
    fn test_logging_config_uses_claude_dir_flag() {
        let config = Config { claude_dir: Some(PathBuf::from("/opt/claude")), ..Config::default() };

        let from_flag = logging_config(&config, Some(Path::new("/srv/claude")), false);
        assert_eq!(from_flag.log_dir, Some(PathBuf::from("/srv/claude/logs")));
        assert_eq!(from_flag.level, "warn");

        let from_file = logging_config(&config, None, true);
        assert_eq!(from_file.log_dir, Some(PathBuf::from("/opt/claude/logs")));
        assert_eq!(from_file.level, "debug");
    }

    #[test]
    fn test_claude_home_flag_wins() {
        let config = Config { claude_dir: Some(PathBuf::from("/opt/claude")), ..Config::default() };
        assert_eq!(claude_home(None, &config).unwrap().root(), Path::new("/opt/claude"));
        assert_eq!(claude_home(Some(Path::new("/srv/claude/")), &config).unwrap().root(), Path::new("/srv/claude"));
    }

    #[test]
    fn test_project_root_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(project_root(Some(temp.path().join("missing"))).is_err());
        assert!(project_root(Some(temp.path().to_path_buf())).unwrap().is_absolute());
    }

    #[test]
    fn test_cmd_discover_text_and_json() {
        let (_temp, discovery, project) = setup();
        fs::write(project.join("CLAUDE.md"), "- Use postgres\n").unwrap();
        let rules = project.join(".claude").join("rules");
        fs::create_dir_all(&rules).unwrap();
        fs::write(rules.join("api.md"), "---\npaths: src/api/**\n---\n- Validate input\n").unwrap();

        let text = cmd_discover(&discovery, &project, false).unwrap();
        assert!(text.contains("./CLAUDE.md"));
        assert!(text.contains("./.claude/rules/api.md"));
        assert!(text.contains("src/api/**"));

        let json: serde_json::Value = serde_json::from_str(&cmd_discover(&discovery, &project, true).unwrap()).unwrap();
        assert_eq!(json[0]["type"], "root");
        assert_eq!(json[1]["type"], "rule");
    }

    #[test]
    fn test_cmd_discover_empty() {
        let (_temp, discovery, project) = setup();
        assert!(cmd_discover(&discovery, &project, false).unwrap().contains("No memory files found"));
        assert_eq!(cmd_discover(&discovery, &project, true).unwrap().trim(), "[]");
    }

    #[test]
    fn test_cmd_route_guardrail() {
        let (_temp, discovery, project) = setup();
        let text = cmd_route(&discovery, &project, "Never force push", Some(LearningType::Guardrail), false).unwrap();
        assert!(text.contains("./.claude/rules/guardrails.md"));
    }

    #[test]
    fn test_cmd_route_ambiguous_json() {
        let (_temp, discovery, project) = setup();
        let out = cmd_route(&discovery, &project, "Something vague", None, true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["route"].is_null());
        assert_eq!(json["topic"], "general");
    }

    #[test]
    fn test_cmd_route_ambiguous_text() {
        let (_temp, discovery, project) = setup();
        let out = cmd_route(&discovery, &project, "Something vague", None, false).unwrap();
        assert!(out.contains("No confident destination"));
        assert!(out.contains("general"));
    }

    #[test]
    fn test_cmd_topic() {
        assert_eq!(cmd_topic("Use gpt-5.1 for reasoning", false).unwrap(), "model-preferences\n");
        let json: serde_json::Value = serde_json::from_str(&cmd_topic("Something vague", true).unwrap()).unwrap();
        assert_eq!(json["topic"], "general");
    }

    #[test]
    fn test_cmd_entries() {
        let (_temp, discovery, project) = setup();
        fs::write(discovery.home().root().join("CLAUDE.md"), "- Always test\n").unwrap();
        fs::write(project.join("CLAUDE.md"), "- Use postgres\n").unwrap();

        let text = cmd_entries(&discovery, &project, false).unwrap();
        assert!(text.contains("Always test"));
        assert!(text.contains("Use postgres"));

        let json: serde_json::Value = serde_json::from_str(&cmd_entries(&discovery, &project, true).unwrap()).unwrap();
        assert_eq!(json[0]["source_type"], "global");
        assert_eq!(json[1]["source_file"], "./CLAUDE.md");
    }

    #[test]
    fn test_cmd_auto_memory() {
        let (_temp, discovery, project) = setup();
        assert!(cmd_auto_memory(&discovery, &project, false).unwrap().contains("No auto-memory topics found"));

        let memory_dir = discovery.home().auto_memory_dir(&project);
        fs::create_dir_all(&memory_dir).unwrap();
        fs::write(memory_dir.join("workflow.md"), "- Run tests\n- Deploy on Fridays never\n").unwrap();

        let text = cmd_auto_memory(&discovery, &project, false).unwrap();
        assert!(text.contains("workflow"));
        assert!(text.contains("2 entries"));
    }
}
