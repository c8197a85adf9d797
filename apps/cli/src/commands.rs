//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use reqminer_core::pipeline::{ProgressReporter, RunConfig, RunOutcome, RunReport, run_project};
use reqminer_inference::OllamaClient;
use reqminer_shared::{
    AppConfig, ChunkConfig, InferenceConfig, ProfileSource, Topic, expand_home, init_config,
    load_config, profiles_file_path,
};
use reqminer_storage::ModelProfileStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Mine requirements from project documents with a local LLM.
#[derive(Parser)]
#[command(
    name = "reqminer",
    version,
    about = "Extract and consolidate technical requirements from a project's documents.",
    long_about = None,
    arg_required_else_help = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyse a project's documents and write the context and summary files.
    Run(RunArgs),

    /// Manage model profiles (orientation + topics per document type).
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct RunArgs {
    /// Project identifier. Names the default folder and the output files.
    project_id: String,

    /// Project folder to read instead of `<docs-root>/<project_id>`.
    path: Option<PathBuf>,

    /// Model profile steering extraction.
    #[arg(short, long)]
    model: Option<String>,

    /// Base folder holding one sub-folder per project.
    #[arg(long, env = "REQMINER_DOCS_ROOT")]
    docs_root: Option<PathBuf>,

    /// Ollama server URL.
    #[arg(long, env = "REQMINER_OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Ollama model name used for generation.
    #[arg(long, env = "REQMINER_LLM")]
    llm: Option<String>,
}

/// Model profile subcommands.
#[derive(Subcommand)]
pub(crate) enum ProfilesAction {
    /// List saved model profiles and their topics.
    List,
    /// Create or replace a model profile.
    Save {
        /// Model id used with `run --model`.
        id: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Orientation appended to the extraction instruction.
        #[arg(long, default_value = "")]
        orientation: String,

        /// Topic to extract (repeatable). Without topics the generic categories are used.
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Replace the orientation used when no profile applies.
    SetDefault {
        /// Orientation text.
        orientation: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Print a parse failure (or help/version) and exit.
///
/// `--version` exits 0; help, usage, and invalid arguments exit 1.
pub(crate) fn exit_with_usage(err: clap::Error) -> ! {
    let code = match err.kind() {
        ErrorKind::DisplayVersion => 0,
        _ => 1,
    };
    let _ = err.print();
    std::process::exit(code)
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reqminer=info",
        1 => "reqminer=debug",
        _ => "reqminer=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Profiles { action } => match action {
            ProfilesAction::List => cmd_profiles_list(),
            ProfilesAction::Save {
                id,
                name,
                orientation,
                topics,
            } => cmd_profiles_save(&id, &name, &orientation, topics),
            ProfilesAction::SetDefault { orientation } => cmd_profiles_set_default(&orientation),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(url) = args.ollama_url {
        config.ollama.base_url = url;
    }
    if let Some(llm) = args.llm {
        config.ollama.model = llm;
    }

    let client = OllamaClient::new(InferenceConfig::try_from(&config)?)?;
    let profiles = open_store(&config)?.load_or_default();

    let run_config = RunConfig {
        project_id: args.project_id,
        docs_root: args
            .docs_root
            .unwrap_or_else(|| expand_home(&config.defaults.docs_root)),
        custom_path: args.path,
        model_id: args.model,
        chunk: ChunkConfig::from(&config),
    };

    info!(
        project = %run_config.project_id,
        model = ?run_config.model_id,
        llm = %client.model(),
        endpoint = %client.endpoint(),
        "starting analysis"
    );

    let reporter = CliProgress::new();
    let outcome = run_project(&run_config, &client, &profiles, &reporter).await;
    reporter.clear();

    match outcome? {
        RunOutcome::Completed(report) => print_report(&report),
        RunOutcome::NoDocuments { folder } => {
            println!(
                "No compatible documents (pdf, docx, doc, txt) found in {}. Nothing to do.",
                folder.display()
            );
        }
        RunOutcome::NoChunks { folder } => {
            println!(
                "The documents in {} contain no extractable text. Nothing to do.",
                folder.display()
            );
        }
        RunOutcome::NoExtractions { folder, extraction } => {
            println!(
                "No technical information was extracted from {}.",
                folder.display()
            );
            if !extraction.failed.is_empty() {
                println!(
                    "  {} of {} blocks failed to reach the model; check that Ollama is running.",
                    extraction.failed.len(),
                    extraction.chunks_seen()
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    let extraction = &report.extraction;
    let profile = match report.profile_source {
        ProfileSource::Stored => "stored profile",
        ProfileSource::Default => "default orientation",
        ProfileSource::UnknownFallback => "unknown model id, default orientation",
    };

    println!();
    println!("  Analysis complete!");
    println!("  Project:    {}", report.project_id);
    println!("  Folder:     {}", report.folder.display());
    if report.unreadable > 0 {
        println!(
            "  Documents:  {} ({} unreadable)",
            report.documents, report.unreadable
        );
    } else {
        println!("  Documents:  {}", report.documents);
    }
    println!("  Profile:    {profile}");
    println!("  Blocks:     {}", report.chunks);
    println!(
        "  Extracted:  {} ({} without relevant info, {} empty, {} failed)",
        extraction.results.len(),
        extraction.no_information,
        extraction.empty,
        extraction.failed.len()
    );
    if let Some(err) = &report.consolidation.document_error {
        println!("  Warning:    consolidation failed ({err})");
    }
    if let Some(err) = &report.consolidation.summary_error {
        println!("  Warning:    summary failed ({err})");
    }
    println!("  Context:    {}", report.outputs.context.display());
    println!("  Summary:    {}", report.outputs.summary.display());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
    println!(
        "  Upload {} under the project's \"Fonte de Dados\" settings to share this context.",
        report
            .outputs
            .context
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    );
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    /// Remove the spinner line; runs that end early never reach `done`.
    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn chunk_progress(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Analysing block {current}/{total}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// profiles
// ---------------------------------------------------------------------------

fn open_store(config: &AppConfig) -> Result<ModelProfileStore> {
    Ok(ModelProfileStore::open(profiles_file_path(config)?))
}

fn cmd_profiles_list() -> Result<()> {
    let store = open_store(&load_config()?)?;
    println!("{}", store.list());
    Ok(())
}

fn cmd_profiles_save(id: &str, name: &str, orientation: &str, topics: Vec<String>) -> Result<()> {
    let store = open_store(&load_config()?)?;
    let topics = topics.into_iter().map(Topic::new).collect();
    let profile = store.save(id, name, orientation, topics)?;
    println!(
        "Saved profile '{}' ({}) with {} topic(s) to {}",
        id.trim(),
        profile.name,
        profile.topics.len(),
        store.path().display()
    );
    Ok(())
}

fn cmd_profiles_set_default(orientation: &str) -> Result<()> {
    let store = open_store(&load_config()?)?;
    store.save_default_orientation(orientation)?;
    println!("Default orientation saved to {}", store.path().display());
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
