//! shieldrule: filter-rule policy service and list tools.

use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use shieldrule::server;
use shieldrule::{
    normalize, Classifier, FilterRule, Guard, JsonFileStore, MatchConfig, Policy,
    RemoteListManager, RuleSet, RuleStore, ServerConfig, StoredRule, SuffixMode,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shieldrule")]
#[command(version)]
#[command(about = "Ad-blocking and parental-control filter rule service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the client and kernel listeners
    Serve {
        /// YAML configuration file
        #[arg(short, long, default_value = "shieldrule.yaml")]
        config: PathBuf,
    },

    /// Classify domains against a local filter list
    Check {
        /// Filter list in adblock syntax
        #[arg(short, long)]
        list: PathBuf,

        /// Suffix comparison for domain anchors (plain, label)
        #[arg(long, default_value = "plain")]
        suffix_mode: String,

        /// Domains or URLs to classify
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Parse one rule and print it as JSON
    Parse {
        /// Rule text, e.g. "||ads.example.com^$third-party"
        pattern: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Check {
            list,
            suffix_mode,
            domains,
        } => {
            init_logger("warn");
            check(&list, &suffix_mode, &domains)
        }
        Commands::Parse { pattern } => {
            init_logger("warn");
            parse(&pattern)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn serve(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load(config_path)?;
    init_logger(&config.log_level);

    let classifier = Arc::new(Classifier::new(config.classifier_config()));

    // Classify with the last stored rules until the list manager catches up
    let store = Arc::new(JsonFileStore::new(&config.rules_path));
    match store.load_rules() {
        Ok(stored) if !stored.is_empty() => {
            let (ruleset, skipped) =
                RuleSet::from_stored(&stored, MatchConfig::new(config.suffix_mode));
            log::info!(
                "Loaded {} stored rules ({} skipped) from {:?}",
                ruleset.len(),
                skipped,
                store.path()
            );
            classifier.replace(ruleset);
        }
        Ok(_) => {}
        Err(e) => log::warn!("Ignoring unreadable rule store: {}", e),
    }

    let policy = Arc::new(Policy::load(&config.policy_path)?);
    let guard = Guard::new(policy, classifier.clone());

    let manager = RemoteListManager::new(&config.list_url, &config.cache_dir, classifier)
        .with_update_interval(config.update_interval())
        .with_store(store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let client = tokio::net::TcpListener::bind(config.client_addr()).await?;
        let kernel = tokio::net::TcpListener::bind(config.kernel_addr()).await?;

        server::run(
            client,
            kernel,
            guard,
            Some(config.policy_path.clone()),
            Some(Arc::new(Mutex::new(manager))),
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for shutdown signal: {}", e);
                }
            },
        )
        .await;

        Ok::<(), std::io::Error>(())
    })?;

    Ok(())
}

fn check(
    list: &Path,
    suffix_mode: &str,
    domains: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = SuffixMode::parse(suffix_mode)
        .ok_or_else(|| format!("invalid suffix mode: {}", suffix_mode))?;

    let (ruleset, skipped) = RuleSet::from_reader(File::open(list)?, MatchConfig::new(mode));
    log::info!("Loaded {} rules ({} skipped)", ruleset.len(), skipped);

    for domain in domains {
        let verdict = ruleset.evaluate(&normalize(domain));
        println!("{}\t{}", domain, verdict);
    }
    Ok(())
}

fn parse(pattern: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rule = FilterRule::parse(pattern)?;
    println!("{}", serde_json::to_string_pretty(&StoredRule::from(&rule))?);
    Ok(())
}
