//! `beltsaver`: conveyor belt mistracking diagnosis from the command line.
//!
//! ## Commands
//!
//! - `diagnose`: resolve four wizard answers into a diagnosis, optionally saving it
//! - `history`: list or delete saved diagnoses
//! - `ask`: stream an answer from the equipment-diagnostics assistant
//! - `classify`: turn a free-text observation into wizard answers
//! - `schema`: print the JSON Schema of the wizard answers
//! - `settings`: show or update `~/.beltsaver/settings.json`

mod render;
mod telemetry;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use beltsaver_assist::{prompt, Conversation, GatewayClient};
use beltsaver_core::{
    resolve_traced, DiagnosisId, DiagnosisStore, DiagnosticInput, Direction, Feature,
    FileDiagnosisStore, Location, OwnerId, SeverityReport, Settings, Symptom, Tier,
};

#[derive(Parser)]
#[command(name = "beltsaver")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conveyor belt mistracking diagnosis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory holding settings.json and saved diagnoses (default: ~/.beltsaver)
    #[arg(long, global = true, env = "BELTSAVER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Chat-completions endpoint of the LLM gateway
    #[arg(long, global = true, env = "BELTSAVER_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// API key for the LLM gateway
    #[arg(long, global = true, env = "BELTSAVER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name sent to the gateway
    #[arg(long, global = true, env = "BELTSAVER_MODEL")]
    model: Option<String>,

    /// Subscription tier: free, pro or enterprise
    #[arg(long, global = true, env = "BELTSAVER_TIER")]
    tier: Option<Tier>,

    /// User the saved diagnoses belong to
    #[arg(long, global = true, env = "BELTSAVER_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose belt mistracking from four answers
    Diagnose {
        /// Where the belt runs off: head, tail, midspan, multiple
        #[arg(long)]
        location: Location,

        /// Which way it runs off: left, right, alternating, loaded
        #[arg(long)]
        direction: Direction,

        /// How bad it is: minor, moderate, severe, critical
        #[arg(long)]
        severity: SeverityReport,

        /// Secondary symptom: edge_wear, spillage, noise, none
        #[arg(long)]
        symptom: Symptom,

        /// Save the diagnosis to history
        #[arg(long)]
        save: bool,

        /// Print the diagnosis as JSON
        #[arg(long)]
        json: bool,

        /// Show which product benefits were considered
        #[arg(long)]
        explain: bool,
    },

    /// Manage saved diagnoses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Ask the equipment-diagnostics assistant
    Ask {
        /// The question
        question: String,

        /// Saved diagnosis to discuss
        #[arg(short, long)]
        diagnosis: Option<DiagnosisId>,
    },

    /// Map a free-text field observation to wizard answers
    Classify {
        /// What was observed on the conveyor
        observation: String,
    },

    /// Print the JSON Schema of the wizard answers
    Schema,

    /// Show or update stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved diagnoses, newest first
    List {
        /// Maximum number of entries
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved diagnosis
    Delete {
        /// Full diagnosis ID
        id: DiagnosisId,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings (API key masked)
    Show,
    /// Write the given global flags to settings.json
    Set,
}

impl Cli {
    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(beltsaver_core::data_dir)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir().join("settings.json")
    }

    /// Settings file first, then environment and flags on top.
    fn settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        let mut settings = beltsaver_core::read_settings_from(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        if let Some(url) = &self.gateway_url {
            settings.gateway_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(tier) = self.tier {
            settings.tier = tier;
        }
        if let Some(user) = &self.user {
            settings.owner = user.clone();
        }
        Ok(settings)
    }

    fn store(&self) -> FileDiagnosisStore {
        FileDiagnosisStore::new(self.data_dir().join("diagnoses"))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs, cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    let owner = OwnerId(settings.owner.clone());

    match &cli.command {
        Commands::Diagnose {
            location,
            direction,
            severity,
            symptom,
            save,
            json,
            explain,
        } => {
            settings.tier.require(Feature::Diagnose)?;
            let input = DiagnosticInput {
                location: *location,
                direction: *direction,
                severity_report: *severity,
                symptom: *symptom,
            };
            cmd_diagnose(&cli, &owner, input, *save, *json, *explain).await
        }
        Commands::History { action } => {
            settings.tier.require(Feature::History)?;
            match action {
                HistoryAction::List { limit, json } => {
                    cmd_history_list(&cli.store(), &owner, *limit, *json).await
                }
                HistoryAction::Delete { id } => {
                    cli.store()
                        .delete(&owner, id)
                        .await
                        .with_context(|| format!("deleting {id}"))?;
                    println!("Deleted {id}");
                    Ok(())
                }
            }
        }
        Commands::Ask {
            question,
            diagnosis,
        } => {
            settings.tier.require(Feature::Assistant)?;
            cmd_ask(&cli, &settings, &owner, question, diagnosis.as_ref()).await
        }
        Commands::Classify { observation } => {
            settings.tier.require(Feature::Classify)?;
            cmd_classify(&settings, observation).await
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(DiagnosticInput);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "gatewayUrl": settings.gateway_url,
                        "model": settings.model,
                        "hasKey": !settings.api_key.is_empty(),
                        "configured": settings.gateway_configured(),
                        "tier": settings.tier,
                        "owner": settings.owner,
                    }))?
                );
                Ok(())
            }
            SettingsAction::Set => {
                let path = cli.settings_path();
                beltsaver_core::write_settings_to(&path, &settings)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Saved settings to {}", path.display());
                Ok(())
            }
        },
    }
}

async fn cmd_diagnose(
    cli: &Cli,
    owner: &OwnerId,
    input: DiagnosticInput,
    save: bool,
    json: bool,
    explain: bool,
) -> Result<()> {
    let resolution = resolve_traced(&input);
    tracing::debug!(issue = %resolution.result.issue_label, "resolved");

    let saved = if save {
        let rec = cli
            .store()
            .insert(owner, input, resolution.result.clone())
            .await
            .context("saving diagnosis")?;
        Some(rec)
    } else {
        None
    };

    if json {
        let value = match &saved {
            Some(rec) => serde_json::to_value(rec)?,
            None if explain => serde_json::to_value(&resolution)?,
            None => serde_json::to_value(&resolution.result)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{}", render::diagnosis(&input, &resolution.result));
    if explain {
        print!("{}", render::explanation(&resolution));
    }
    if let Some(rec) = saved {
        println!("\nSaved as {}", rec.id);
    }
    Ok(())
}

async fn cmd_history_list(
    store: &dyn DiagnosisStore,
    owner: &OwnerId,
    limit: usize,
    json: bool,
) -> Result<()> {
    let records = store
        .list_recent(owner, limit)
        .await
        .context("loading history")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No saved diagnoses.");
    } else {
        for rec in &records {
            println!("{}", render::history_line(rec));
        }
    }
    Ok(())
}

/// Cancel `token` when the user presses Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

async fn cmd_ask(
    cli: &Cli,
    settings: &Settings,
    owner: &OwnerId,
    question: &str,
    diagnosis: Option<&DiagnosisId>,
) -> Result<()> {
    let client = GatewayClient::new(settings)?;
    let mut convo = Conversation::with_system(prompt::system_prompt());

    match diagnosis {
        Some(id) => {
            let rec = cli
                .store()
                .list_recent(owner, usize::MAX)
                .await
                .context("loading history")?
                .into_iter()
                .find(|r| &r.id == id);
            let Some(rec) = rec else {
                bail!("no saved diagnosis {id}");
            };
            convo.push_user(prompt::discuss_message(&rec.input, &rec.result, question));
        }
        None => convo.push_user(question),
    }

    let cancel = cancel_on_ctrl_c();
    let mut stdout = std::io::stdout();
    beltsaver_assist::ask(&client, &mut convo, cancel, |delta| {
        print!("{delta}");
        let _ = stdout.flush();
    })
    .await?;
    println!();
    Ok(())
}

async fn cmd_classify(settings: &Settings, observation: &str) -> Result<()> {
    let client = GatewayClient::new(settings)?;
    let draft = beltsaver_assist::classify(&client, observation, cancel_on_ctrl_c()).await?;
    println!("{}", serde_json::to_string_pretty(&draft)?);

    match draft.complete() {
        Ok(input) => {
            let resolution = resolve_traced(&input);
            print!("\n{}", render::diagnosis(&input, &resolution.result));
        }
        Err(e) => println!("\n{e}; answer the rest with `beltsaver diagnose`."),
    }
    Ok(())
}
