use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use shared_types::{CreateLeadRequest, LeadPriority, LeadStage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use leadboard_client::config::{mask_token, ClientConfig};
use leadboard_client::render::{render_board, render_table};
use leadboard_client::{
    DropOutcome, HttpLeadApi, InMemoryLeadApi, LeadApi, LeadFilter, LeadSync, NotificationLevel,
    Notifier, PipelineView, RefreshOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "leadboard", author, version, about = "Lead pipeline board for the admin API", long_about = None)]
struct Cli {
    /// Config file, defaults to the user config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long)]
    log_file_path: Option<String>,

    /// Run against a seeded in-memory backend instead of the API
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Matches name, email or phone
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    source: Option<String>,

    #[arg(long)]
    stage: Option<LeadStage>,

    #[arg(long)]
    priority: Option<LeadPriority>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Kanban board
    Board {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the lead table
    List {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Page size, defaults to the configured one
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Drag a lead onto another stage column
    Move { lead_id: String, stage: LeadStage },
    /// Assign a lead to an agent
    Assign { lead_id: String, agent_id: String },
    /// Delete one or more leads
    Delete {
        #[arg(required = true)]
        lead_ids: Vec<String>,
    },
    /// Create a lead
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        priority: Option<LeadPriority>,
    },
    /// Show the active configuration
    Config,
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("leadboard.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_filter(base: &LeadFilter, filters: FilterArgs) -> LeadFilter {
    base.with_search(filters.search)
        .with_source(filters.source)
        .with_stage(filters.stage)
        .with_priority(filters.priority)
}

async fn flush_notifications(notifier: &Notifier) {
    for notification in notifier.drain().await {
        let prefix = match notification.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Info => "i",
            NotificationLevel::Error => "✗",
        };
        println!("{} {}", prefix, notification.message);
    }
}

async fn ensure_loaded(view: &PipelineView) -> Result<()> {
    match view.refresh().await {
        RefreshOutcome::Failed(e) => bail!("Failed to load leads: {}", e),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file_path.as_deref());

    let (config, config_path) = match &cli.config {
        Some(path) => (
            ClientConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            path.clone(),
        ),
        None => ClientConfig::load().context("Failed to load config")?,
    };

    if let Command::Config = cli.command {
        println!("Config file: {}", config_path.display());
        println!("API base URL: {}", config.api.base_url);
        println!("Timeout: {}s", config.api.timeout_secs);
        println!(
            "Auth token: {}",
            config
                .api
                .auth_token
                .as_deref()
                .map(mask_token)
                .unwrap_or_else(|| "(none)".to_string())
        );
        println!("Page size: {}", config.board.page_size);
        return Ok(());
    }

    let api: Arc<dyn LeadApi> = if cli.demo {
        tracing::info!("Using in-memory demo backend");
        Arc::new(
            InMemoryLeadApi::with_demo_data()
                .await
                .context("Failed to seed demo data")?,
        )
    } else {
        tracing::info!("Using lead API at {}", config.api.base_url);
        Arc::new(HttpLeadApi::new(&config.api).context("Failed to build HTTP client")?)
    };

    let notifier = Notifier::new();
    let sync = Arc::new(LeadSync::new(api));
    let view = PipelineView::new(sync, notifier.clone(), config.board.page_size);

    let result = run(&view, cli.command).await;
    flush_notifications(&notifier).await;
    view.unmount().await;
    result
}

async fn run(view: &PipelineView, command: Command) -> Result<()> {
    match command {
        Command::Board { filters } => {
            let filter = build_filter(&view.filter().await, filters);
            if let RefreshOutcome::Failed(e) = view.apply_filter(filter).await {
                bail!("Failed to load leads: {}", e);
            }
            print!("{}", render_board(&view.board().await));
        }
        Command::List {
            filters,
            offset,
            limit,
        } => {
            let mut filter = build_filter(&view.filter().await, filters);
            if let Some(limit) = limit {
                filter = filter.with_limit(limit);
            }
            let filter = filter.with_offset(offset);
            if let RefreshOutcome::Failed(e) = view.apply_filter(filter).await {
                bail!("Failed to load leads: {}", e);
            }
            let pagination = view.pagination().await.unwrap_or_default();
            print!(
                "{}",
                render_table(&view.leads().await, &pagination, &view.selection().await)
            );
        }
        Command::Move { lead_id, stage } => {
            ensure_loaded(view).await?;
            view.begin_drag(&lead_id).await?;
            view.hover(stage).await?;
            match view.drop_card().await {
                DropOutcome::NoOp => println!("Lead is already in {}", stage.label()),
                DropOutcome::Moved(_) => print!("{}", render_board(&view.board().await)),
                DropOutcome::Failed { error, .. } => bail!("Move failed: {}", error),
                DropOutcome::Cancelled | DropOutcome::Detached => {}
            }
        }
        Command::Assign { lead_id, agent_id } => {
            ensure_loaded(view).await?;
            view.toggle_selected(&lead_id).await;
            let lead = view.assign_selected(&agent_id).await?;
            println!(
                "{} -> {}",
                lead.name,
                lead.assigned_to
                    .map(|agent| agent.name)
                    .unwrap_or(agent_id)
            );
        }
        Command::Delete { lead_ids } => {
            ensure_loaded(view).await?;
            for lead_id in &lead_ids {
                view.toggle_selected(lead_id).await;
            }
            let report = view.bulk_delete().await;
            if !report.is_success() {
                for failure in &report.failures {
                    tracing::debug!("{}: {}", failure.lead_id, failure.error);
                }
                bail!("{}", report.summary());
            }
        }
        Command::Create {
            name,
            email,
            phone,
            source,
            priority,
        } => {
            let request = CreateLeadRequest {
                name,
                email,
                phone,
                source,
                priority,
                ..Default::default()
            };
            let lead = view.create_lead(&request).await?;
            println!("{} ({})", lead.id, lead.stage.label());
        }
        Command::Config => {}
    }

    Ok(())
}
