// ==========================================
// 课程体系管理 - 命令行入口
// ==========================================
// 子命令: init / program / parse / import / show / history / rules
// 输出: stdout 为命令结果，日志写 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use curriculum_importer::app::{get_default_db_path, AppState};
use curriculum_importer::config::{ConfigManager, ImportConfigReader};
use curriculum_importer::domain::TopicNode;
use curriculum_importer::logging::{self, LogFormat};
use curriculum_importer::{ImportRules, ImportSummary};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "curriculum-import",
    version,
    about = "Import pasted curriculum tables into a program/discipline hierarchy"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database path (default: $CURRICULUM_DB_PATH or the user data dir).
    #[arg(long = "db", value_name = "PATH", global = true)]
    db: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema.
    Init,

    /// Manage programs.
    #[command(subcommand)]
    Program(ProgramCommand),

    /// Parse a file and print the topic tree as JSON.
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Import a file into a discipline.
    Import(ImportArgs),

    /// Print a discipline's topic/lesson/question tree.
    Show {
        #[arg(long = "discipline", value_name = "ID")]
        discipline: i64,
    },

    /// List recent import batches.
    History {
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Inspect or replace the import keyword rules.
    #[command(subcommand)]
    Rules(RulesCommand),
}

#[derive(Subcommand)]
enum ProgramCommand {
    /// Add a program.
    Add { name: String },
    /// List programs.
    List,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Print the active rules as JSON.
    Show,
    /// Store rules from a JSON file (missing fields keep defaults).
    Set {
        #[arg(value_name = "JSON_FILE")]
        file: PathBuf,
    },
    /// Drop the stored override and return to the built-in rules.
    Reset,
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["discipline", "new_discipline"])))]
struct ImportArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[arg(long = "program", value_name = "ID")]
    program: i64,

    /// Existing discipline id.
    #[arg(long = "discipline", value_name = "ID")]
    discipline: Option<i64>,

    /// Name of a discipline to create (reused if one with the same name exists).
    #[arg(long = "new-discipline", value_name = "NAME")]
    new_discipline: Option<String>,

    /// Run the import and roll it back, reporting what would change.
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::debug!(db_path = %db_path, "使用数据库");

    let state = AppState::new(db_path.clone())
        .with_context(|| format!("无法打开数据库 {}", db_path))?;

    match cli.command {
        Command::Init => {
            println!("database ready: {}", state.db_path);
        }
        Command::Program(ProgramCommand::Add { name }) => {
            let id = state
                .curriculum_api
                .create_program(&name)
                .context("创建培养方案失败")?;
            println!("{}", id);
        }
        Command::Program(ProgramCommand::List) => {
            for program in state.curriculum_api.list_programs()? {
                println!("{}\t{}", program.id, program.name);
            }
        }
        Command::Parse { file } => {
            let topics = state
                .import_api
                .parse_file(&file)
                .with_context(|| format!("解析文件失败: {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&topics)?);
        }
        Command::Import(args) => {
            let summary = state
                .import_api
                .import_file(
                    args.program,
                    args.discipline,
                    args.new_discipline.as_deref(),
                    &args.file,
                    args.dry_run,
                )
                .with_context(|| format!("导入失败: {}", args.file.display()))?;
            print_summary(&summary);
        }
        Command::Show { discipline } => {
            let tree = state
                .curriculum_api
                .discipline_tree(discipline)
                .with_context(|| format!("读取学科 {} 失败", discipline))?;
            print_tree(&tree);
        }
        Command::History { limit } => {
            for batch in state.import_api.recent_batches(limit)? {
                println!(
                    "{}\t{}\tprogram={}\tdiscipline={}\ttopics+{}\tlessons+{}\tquestions+{}\tupdated={}",
                    batch.imported_at.to_rfc3339(),
                    batch.batch_id,
                    batch.program_id,
                    batch.discipline_id,
                    batch.topics_added,
                    batch.lessons_added,
                    batch.questions_added,
                    batch.lessons_updated,
                );
            }
        }
        Command::Rules(command) => run_rules(&state.db_path, command)?,
    }

    Ok(())
}

fn run_rules(db_path: &str, command: RulesCommand) -> Result<()> {
    let config = ConfigManager::new(db_path).context("打开配置失败")?;
    match command {
        RulesCommand::Show => {
            let rules = config.get_import_rules()?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        RulesCommand::Set { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("读取规则文件失败: {}", file.display()))?;
            let rules: ImportRules =
                serde_json::from_str(&raw).context("规则文件不是合法的 JSON")?;
            config.set_import_rules(&rules)?;
            println!("rules updated");
        }
        RulesCommand::Reset => {
            let removed =
                config.remove_global_config_value(curriculum_importer::config::config_keys::IMPORT_RULES)?;
            println!("{}", if removed { "rules reset" } else { "no override stored" });
        }
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    let mode = if summary.dry_run { "dry run (rolled back)" } else { "committed" };
    println!("{} batch {}", mode, summary.batch_id);
    println!("discipline: {}", summary.discipline_id);
    println!("topics added:    {}", summary.topics_added);
    println!("lessons added:   {}", summary.lessons_added);
    println!("lessons updated: {}", summary.lessons_updated);
    println!("questions added: {}", summary.questions_added);
}

fn format_hours(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_tree(tree: &[TopicNode]) {
    for topic in tree {
        println!("{}. {}", topic.order_index, topic.topic.title);
        for node in &topic.lessons {
            let lesson_type = node
                .lesson_type
                .as_deref()
                .map(|t| format!(" [{}]", t))
                .unwrap_or_default();
            println!(
                "    {}. {}{} (total {}, classroom {}, self-study {})",
                node.order_index,
                node.lesson.title,
                lesson_type,
                format_hours(node.lesson.total_hours),
                format_hours(node.lesson.classroom_hours),
                format_hours(node.lesson.self_study_hours),
            );
            for (order, question) in &node.questions {
                println!("        {}) {}", order, question.content);
            }
        }
    }
}
