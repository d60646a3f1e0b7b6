use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use sde_catalog::{EntityDraft, EntityId, EntityName, IndustryFilter, Sensitivity};
use sde_sync::{ActionPreview, EngineConfig, HttpBackend, ReconciliationEngine, SyncError};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_HINTS: &str = ".sde-hints.json";

fn cli() -> Command {
    let industry = Arg::new("industry")
        .long("industry")
        .help("Industry filter (omit for the last used one, 'all' for general-purpose)");

    Command::new("sdectl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage a client's sensitive data entity selection")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML config file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .help("Backend root URL (overrides config and SDE_BASE_URL)"),
        )
        .arg(
            Arg::new("client")
                .long("client")
                .global(true)
                .help("Client id (overrides config and SDE_CLIENT_ID)"),
        )
        .arg(
            Arg::new("yes")
                .long("yes")
                .short('y')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Confirm destructive actions without prompting"),
        )
        .subcommand(
            Command::new("catalog")
                .about("List catalogue entries for an industry")
                .arg(industry.clone()),
        )
        .subcommand(
            Command::new("status")
                .about("Show pending and saved selections")
                .arg(industry.clone()),
        )
        .subcommand(
            Command::new("toggle")
                .about("Flip selection of catalogue entries by id")
                .arg(industry.clone())
                .arg(Arg::new("ids").required(true).num_args(1..).help("Entity ids")),
        )
        .subcommand(
            Command::new("select-all")
                .about("Select every entry of the industry")
                .arg(industry.clone()),
        )
        .subcommand(
            Command::new("deselect-all")
                .about("Deselect every entry of the industry; other industries are kept")
                .arg(industry.clone()),
        )
        .subcommand(
            Command::new("unselect")
                .about("Drop a pending selection by name")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("save")
                .about("Preview and store new selections")
                .arg(industry.clone()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove one saved selection")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(Command::new("clear-all").about("Remove every saved selection"))
        .subcommand(
            Command::new("add-entity")
                .about("Add a catalogue entry")
                .arg(industry)
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("sensitivity")
                        .long("sensitivity")
                        .default_value("Medium")
                        .help("Low, Medium or High"),
                )
                .arg(Arg::new("pattern").long("pattern").required(true).help("Detection regex"))
                .arg(Arg::new("classification").long("classification")),
        )
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::new(),
    }
    .with_env_overrides();

    if let Some(url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(url.clone());
    }
    if let Some(client) = matches.get_one::<String>("client") {
        config = config.with_client_id(client.clone());
    }
    if config.hints_path.is_none() {
        config = config.with_hints_path(DEFAULT_HINTS);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build the engine, restore hints and load catalog plus saved selection
async fn open(config: &EngineConfig, industry: Option<&String>) -> Result<ReconciliationEngine> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let engine = ReconciliationEngine::from_config(config, backend)?;

    let cached = engine.warm_start();
    let filter = industry.map_or_else(|| cached.unwrap_or_default(), |tag| IndustryFilter::from(tag.as_str()));
    engine.load_catalog(filter).await.map_err(explain)?;
    if let Err(err) = engine.refresh_persisted().await {
        tracing::warn!(error = %err, "saved selection unavailable; continuing without it");
        print_notice(&engine);
    }
    Ok(engine)
}

fn explain(err: SyncError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn confirm_prompt(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_notice(engine: &ReconciliationEngine) {
    if let Some(notice) = engine.feedback().current() {
        eprintln!("{}", notice.message);
    }
}

fn print_catalog(engine: &ReconciliationEngine) {
    let snapshot = engine.snapshot();
    println!("Catalogue ({}):", snapshot.filter);
    for row in &snapshot.rows {
        println!(
            "  [{}] {:>6}  {:<24} {:<6} {}{}",
            if row.selected { "x" } else { " " },
            row.entity.id,
            row.entity.name,
            row.entity.sensitivity,
            row.entity.classification,
            if row.saved { "  (saved)" } else { "" },
        );
    }
}

fn print_status(engine: &ReconciliationEngine) {
    let snapshot = engine.snapshot();
    println!("Pending ({}):", snapshot.pending.len());
    for row in &snapshot.pending {
        let mut tags = Vec::new();
        if row.saved {
            tags.push("saved");
        }
        if row.outside_filter {
            tags.push("different industry");
        }
        println!("  {:<24} {:<6} {}", row.record.name, row.record.sensitivity, tags.join(", "));
    }
    println!("Saved ({}):", snapshot.persisted.len());
    for record in &snapshot.persisted {
        println!(
            "  {:<24} {:<6} {}",
            record.name,
            record.sensitivity,
            record.protection_method.as_deref().unwrap_or("-")
        );
    }
}

/// Ask, then confirm or cancel the open preview
async fn settle(engine: &ReconciliationEngine, preview: &ActionPreview, assume_yes: bool) -> Result<()> {
    if !confirm_prompt(&preview.summary(), assume_yes)? {
        engine.cancel().map_err(explain)?;
        println!("Cancelled.");
        return Ok(());
    }
    let outcome = engine.confirm().await.map_err(explain)?;
    tracing::debug!(?outcome, "action finished");
    print_notice(engine);
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let assume_yes = matches.get_flag("yes");

    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    let industry = args.try_get_one::<String>("industry").ok().flatten();
    let engine = open(&config, industry).await?;

    match name {
        "catalog" => print_catalog(&engine),
        "status" => print_status(&engine),
        "toggle" => {
            for id in args.get_many::<String>("ids").into_iter().flatten() {
                engine.toggle(&EntityId::from(id.as_str())).map_err(explain)?;
                print_notice(&engine);
            }
        }
        "select-all" => {
            engine.select_all_visible();
            print_notice(&engine);
        }
        "deselect-all" => {
            engine.deselect_all_visible();
            print_notice(&engine);
        }
        "unselect" => {
            let name = required_name(args)?;
            if !engine.unselect(&name) {
                bail!("'{name}' is not selected");
            }
            print_notice(&engine);
        }
        "save" => {
            let preview = engine.preview_save().await.map_err(explain)?;
            if preview.is_fail_open() {
                print_notice(&engine);
            }
            for record in preview.delta() {
                println!("  + {} ({})", record.name, record.sensitivity);
            }
            if preview.is_up_to_date() {
                engine.confirm().await.map_err(explain)?;
                print_notice(&engine);
            } else {
                settle(&engine, &ActionPreview::Save(preview), assume_yes).await?;
            }
        }
        "remove" => {
            let preview = engine.preview_remove(required_name(args)?).map_err(explain)?;
            settle(&engine, &preview, assume_yes).await?;
        }
        "clear-all" => {
            let preview = engine.preview_clear_all().map_err(explain)?;
            settle(&engine, &preview, assume_yes).await?;
        }
        "add-entity" => {
            let sensitivity: Sensitivity = args
                .get_one::<String>("sensitivity")
                .map_or(Ok(Sensitivity::default()), |s| s.parse())?;
            let mut draft = EntityDraft::new(
                args.get_one::<String>("name").cloned().unwrap_or_default(),
                sensitivity,
                args.get_one::<String>("pattern").cloned().unwrap_or_default(),
            );
            if let Some(tag) = industry {
                draft = draft.with_industry(tag.clone());
            }
            if let Some(classification) = args.get_one::<String>("classification") {
                draft = draft.with_classification(classification.clone());
            }
            let created = engine.create_entity(draft).await.map_err(explain)?;
            println!("Created {} (id {})", created.name, created.id);
        }
        other => bail!("unknown command '{other}'"),
    }
    Ok(())
}

fn required_name(args: &ArgMatches) -> Result<EntityName> {
    let raw = args.get_one::<String>("name").context("missing name")?;
    Ok(EntityName::new(raw.as_str())?)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli().get_matches()).await {
        eprintln!("error: {err}");
        tracing::debug!(error = ?err, "command failed");
        std::process::exit(1);
    }
}
