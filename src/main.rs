//! Backoffice CLI
//!
//! Exercises the resource engine against JSON seed data.
//!
//! ## Usage
//!
//! ```bash
//! # Configured resources and groups
//! backoffice resources
//!
//! # Rendered create form of a resource
//! backoffice --org 7 describe event_translations --mode create
//!
//! # List screen, as an editor of organization 7
//! backoffice --seed seed.json --org 7 --role editor list events
//!
//! # Bulk invitee import
//! backoffice --seed seed.json import guests.json --org 7
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backoffice::config::Command;
use backoffice::permissions::{AccessOracle, Role, StaticAccessOracle};
use backoffice::{
    default_registry, AdminContext, Args, FormMode, FormOrchestrator, InviteeImporter,
    LockedFieldSet, ListScreen, MemoryBackend, NavigationContext, Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let config = args.admin_config().context("loading configuration")?;
    let registry = default_registry().context("building schema registry")?;

    let backend = match &config.seed_path {
        Some(path) => MemoryBackend::load_seed(path)
            .with_context(|| format!("loading seed data from {}", path.display()))?,
        None => MemoryBackend::new(),
    };
    let ctx = AdminContext::new(registry, backend, config.clone());
    let session = session(&args)?;

    match &args.command {
        Command::Resources => print_resources(&ctx),
        Command::Describe { resource, mode } => {
            describe(&ctx, &session, resource, (*mode).into())?
        }
        Command::List {
            resource,
            page,
            query,
        } => {
            let nav = NavigationContext::from_query(query.as_deref().unwrap_or_default())?;
            let mut state = ListScreen::mount(&ctx, &session, resource, nav).await;
            if let Some(screen) = state.ready_mut() {
                if *page > 1 {
                    screen.go_to_page(&ctx, *page).await;
                }
            }
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Import { rows, org, .. } => {
            let content = std::fs::read_to_string(rows)
                .with_context(|| format!("reading {}", rows.display()))?;
            let rows_json: Vec<Value> =
                serde_json::from_str(&content).context("import file must be a JSON array")?;

            let importer =
                InviteeImporter::new(&ctx.registry, ctx.backend.clone(), config.import.clone())?;
            let report = importer.import(rows_json, org).await?;
            let file_name = rows
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            importer.record_run(org, &file_name, &report).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("backoffice={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs go to stderr
    if args.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn session(args: &Args) -> anyhow::Result<Session> {
    let mut oracle = StaticAccessOracle::new();
    if args.platform_admin {
        oracle = oracle.with_platform_admin(&args.user);
    }
    if let Some(org) = &args.organization {
        oracle = oracle.with_role(&args.user, org, Role::parse(&args.role)?);
    }
    let oracle: Arc<dyn AccessOracle> = Arc::new(oracle);

    let mut session = Session::new(&args.user, oracle);
    session.switch_organization(args.organization.as_deref());
    info!(user = %args.user, org = ?args.organization, "Session started");
    Ok(session)
}

fn print_resources(ctx: &AdminContext) {
    for schema in ctx.registry.iter() {
        let group = ctx
            .registry
            .group_of(&schema.name)
            .map(|g| g.name.as_str())
            .unwrap_or("-");
        println!(
            "{:<28} {:<26} org_key={:<16} group={}",
            schema.name,
            schema.label,
            schema.org_key.as_deref().unwrap_or("-"),
            group
        );
    }
    println!();
    for group in ctx.registry.groups() {
        println!(
            "{}{} -> {}",
            group.route,
            if group.hidden { " (hidden)" } else { "" },
            group.resources.join(", ")
        );
    }
}

fn describe(
    ctx: &AdminContext,
    session: &Session,
    resource: &str,
    mode: FormMode,
) -> anyhow::Result<()> {
    let schema = ctx.schema(resource)?;
    let locks = match mode {
        FormMode::Create => LockedFieldSet::for_create(
            schema,
            &NavigationContext::default(),
            session.active_organization(),
        ),
        FormMode::Edit => LockedFieldSet::new(),
    };
    let form = FormOrchestrator::new(schema.fields.clone(), mode, None, locks);
    println!("{}", serde_json::to_string_pretty(&form.widgets())?);
    Ok(())
}
