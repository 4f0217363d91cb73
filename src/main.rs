use clap::{Args as ClapArgs, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use webui_verify::browser::{ChromeBackend, ChromeBackendConfig};
use webui_verify::config::{self, Config};
use webui_verify::model::{ContextId, scenario_set, scenario_set_names, style_model};
use webui_verify::preflight::check_reachable;
use webui_verify::runner::graph_styles::REPORT_NAME as GRAPH_STYLES_REPORT;
use webui_verify::runner::{
    GraphStyleSuite, PII_REPORT_NAME, PiiSuite, QuerySuite, RunnerSettings, UPLOADS_REPORT_NAME, UploadSecuritySuite,
};

/// webui-verify - end-to-end verification of a running web UI
#[derive(Parser, Debug)]
#[command(
    name = "webui-verify",
    about = "Drive a browser against a running web UI and verify theme, graph and palette contracts",
    after_help = "ENVIRONMENT VARIABLES:\n\
        BASE_URL              Application under test\n\
        ADMIN_USER            Login user\n\
        ADMIN_PASS            Login password (fallbacks: SENTINEL_ADMIN_PASSWORD, SENTINEL_BOOTSTRAP_ADMIN_PASSWORD)\n\
        OUTPUT_JSON           Report path\n\
        SCREENSHOT_DIR        Screenshot directory\n\
        SKIP_SEED_DOCS        Skip document seeding\n\
        TEST_DOCS_DIR         Seed documents directory\n\
        SCENARIO              Query scenario set\n\
        RUN_LABEL             PII retest label\n\
        FIXTURES_DIR          PII and upload fixtures directory\n\
        ENTITY_TAB_PAUSE_MS   Render pause after opening the entity graph\n\
        HEADLESS              Run the browser without a window\n\
        RUST_LOG              Log filter (default: info)"
)]
struct Args {
    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs, Debug)]
struct TargetArgs {
    /// Application under test
    #[arg(long, global = true, env = "BASE_URL")]
    base_url: Option<String>,

    /// Login user
    #[arg(long, global = true, env = "ADMIN_USER")]
    user: Option<String>,

    /// Report path (default: per suite)
    #[arg(short, long, global = true, env = "OUTPUT_JSON")]
    output: Option<PathBuf>,

    /// Screenshot directory
    #[arg(long, global = true, env = "SCREENSHOT_DIR")]
    screenshot_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Do not probe the target before launching the browser
    #[arg(long, global = true)]
    skip_preflight: bool,
}

impl TargetArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.target.base_url = url.clone();
        }
        if let Some(user) = &self.user {
            config.target.admin_user = user.clone();
        }
        if let Some(output) = &self.output {
            config.output.output_json = Some(output.clone());
        }
        if let Some(dir) = &self.screenshot_dir {
            config.output.screenshot_dir = dir.clone();
        }
        if self.headed {
            config.run.headless = false;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// CSS variables, query and entity graph styling across every context and theme
    Styles {
        /// Documents were seeded out of band
        #[arg(long)]
        skip_seed: bool,

        /// Seed documents directory (default: TEST_DOCS_DIR or ./test_docs)
        #[arg(long)]
        test_docs_dir: Option<PathBuf>,

        /// Only these contexts (comma-separated, e.g. "FINANCE,MEDICAL")
        #[arg(long, value_delimiter = ',')]
        contexts: Vec<ContextId>,
    },

    /// Run a named query scenario set
    Queries {
        /// Scenario set name, see `list` (default: SCENARIO or HYDE)
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// PII redaction retest
    Pii {
        /// MASK, or a label containing TOKEN for tokenization (default: RUN_LABEL or MASK)
        #[arg(short, long)]
        label: Option<String>,

        /// Directory holding the PII fixtures (default: FIXTURES_DIR or ./fixtures)
        #[arg(long)]
        fixtures_dir: Option<PathBuf>,
    },

    /// Upload type enforcement and the air-gap network guard
    Uploads {
        /// Directory holding the upload fixtures (default: FIXTURES_DIR or ./fixtures)
        #[arg(long)]
        fixtures_dir: Option<PathBuf>,
    },

    /// List query scenario sets
    List,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn launch(config: &Config) -> Result<ChromeBackend, Box<dyn Error>> {
    Ok(ChromeBackend::launch(
        &ChromeBackendConfig::default().headless(config.run.headless),
    )?)
}

fn preflight(config: &Config, skip: bool) -> Result<(), Box<dyn Error>> {
    if skip {
        return Ok(());
    }
    check_reachable(&config.target.base_url, config.timeouts.preflight.as_secs())?;
    Ok(())
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    init_tracing();

    let mut config = config::get().clone();
    args.target.apply(&mut config);

    let outcome = match args.command {
        Some(Commands::Styles {
            skip_seed,
            test_docs_dir,
            contexts,
        }) => {
            preflight(&config, args.target.skip_preflight)?;
            let settings = RunnerSettings::from_config(&config, GRAPH_STYLES_REPORT);
            let mut suite = GraphStyleSuite::new(settings, style_model())
                .skip_seed(skip_seed || config.run.skip_seed)
                .test_docs_dir(test_docs_dir.unwrap_or_else(|| config.run.test_docs_dir.clone()));
            if !contexts.is_empty() {
                suite = suite.contexts(&contexts);
            }
            suite.run(launch(&config)?)?
        }
        Some(Commands::Queries { scenario }) => {
            let scenario = scenario.unwrap_or_else(|| config.run.scenario.clone());
            let Some(set) = scenario_set(&scenario) else {
                return Err(format!(
                    "unknown scenario {} (known: {})",
                    scenario,
                    scenario_set_names().join(", ")
                )
                .into());
            };
            preflight(&config, args.target.skip_preflight)?;
            let settings = RunnerSettings::from_config(&config, &QuerySuite::report_name(set.name));
            QuerySuite::new(settings, set).run(launch(&config)?)?
        }
        Some(Commands::Pii { label, fixtures_dir }) => {
            preflight(&config, args.target.skip_preflight)?;
            let settings = RunnerSettings::from_config(&config, PII_REPORT_NAME);
            let label = label.unwrap_or_else(|| config.run.run_label.clone());
            let fixtures_dir = fixtures_dir.unwrap_or_else(|| config.run.fixtures_dir.clone());
            PiiSuite::new(settings, &label, &fixtures_dir).run(launch(&config)?)?
        }
        Some(Commands::Uploads { fixtures_dir }) => {
            preflight(&config, args.target.skip_preflight)?;
            let settings = RunnerSettings::from_config(&config, UPLOADS_REPORT_NAME);
            let fixtures_dir = fixtures_dir.unwrap_or_else(|| config.run.fixtures_dir.clone());
            UploadSecuritySuite::new(settings, &fixtures_dir).run(launch(&config)?)?
        }
        Some(Commands::List) => {
            for name in scenario_set_names() {
                if let Some(set) = scenario_set(name) {
                    println!("{:<14} {} ({} queries)", set.name, set.label, set.tests.len());
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
        None => {
            println!("webui-verify - end-to-end verification of a running web UI");
            println!();
            println!("Usage: webui-verify <COMMAND>");
            println!();
            println!("Commands:");
            println!("  styles   CSS variables and graph styling across contexts and themes");
            println!("  queries  Run a named query scenario set");
            println!("  pii      PII redaction retest");
            println!("  uploads  Upload type enforcement and air-gap guard");
            println!("  list     List query scenario sets");
            println!();
            println!("Run with --help for more information.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(ExitCode::from(outcome.exit_code()))
}
