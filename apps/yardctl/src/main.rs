use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    create_patio, created_message, ApiClient, BoxDraft, EventSubscription, PatioEditor,
    ReportStream, SubmitError, Wizard, WizardData,
};
use futures::StreamExt;
use serde::Serialize;
use shared::{
    domain::{NotificationId, PatioId, PatioStatus},
    protocol::{NotificationFilter, PageRequest, PatioFilter},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "yardctl", about = "Yard administration from the terminal")]
struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    cep_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Patio(PatioCommand),
    #[command(subcommand)]
    Boxes(BoxesCommand),
    /// Looks up a postal code.
    Cep { cep: String },
    #[command(subcommand)]
    Parking(ParkingCommand),
    #[command(subcommand)]
    Notifications(NotificationsCommand),
    /// Prints live report snapshots until interrupted.
    Report {
        #[arg(value_enum, default_value_t = ReportKind::Analytics)]
        kind: ReportKind,
    },
}

#[derive(Subcommand, Debug)]
enum PatioCommand {
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
    Show { id: i64 },
    /// Prints the wizard document of an existing patio.
    Export { id: i64 },
    /// Creates a patio with its contact, address, zones and boxes from a wizard document.
    Create { file: PathBuf },
    /// Applies an edited wizard document to an existing patio.
    Save { id: i64, file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum BoxesCommand {
    List { patio: i64 },
    /// Makes the patio's boxes match the given list.
    Sync(SyncArgs),
    /// Server-side batch generation.
    Generate { prefix: String, quantity: u32 },
}

#[derive(Args, Debug)]
struct SyncArgs {
    patio: i64,
    /// JSON array of boxes.
    #[arg(long, conflicts_with = "names")]
    file: Option<PathBuf>,
    names: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum ParkingCommand {
    Active {
        #[arg(long)]
        patio: Option<i64>,
    },
    Find { plate: String },
}

#[derive(Subcommand, Debug)]
enum NotificationsCommand {
    List {
        #[arg(long)]
        unread: bool,
    },
    Read { id: i64 },
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportKind {
    Analytics,
    Occupancy,
    Movements,
    Maintenance,
}

impl From<ReportKind> for ReportStream {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Analytics => Self::Analytics,
            ReportKind::Occupancy => Self::Occupancy,
            ReportKind::Movements => Self::Movements,
            ReportKind::Maintenance => Self::Maintenance,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config);
    if let Some(v) = cli.api_url {
        settings.api_base_url = v;
    }
    if let Some(v) = cli.cep_url {
        settings.cep_base_url = v;
    }
    if let Some(v) = cli.timeout_secs {
        settings.request_timeout_secs = v;
    }
    let api = ApiClient::new(settings.client_config()?).context("building api client")?;
    info!(base_url = %api.base_url(), "yardctl: ready");

    match cli.command {
        Command::Patio(command) => run_patio(&api, settings.cache_ttl(), command).await,
        Command::Boxes(command) => run_boxes(&api, settings.cache_ttl(), command).await,
        Command::Cep { cep } => {
            let locality = api.lookup_cep(&cep).await.map_err(user_error)?;
            print_json(&locality)
        }
        Command::Parking(command) => run_parking(&api, command).await,
        Command::Notifications(command) => run_notifications(&api, command).await,
        Command::Report { kind } => watch(api.subscribe_report(kind.into())?).await,
    }
}

async fn run_patio(api: &ApiClient, ttl: Duration, command: PatioCommand) -> Result<()> {
    match command {
        PatioCommand::List { name, inactive } => {
            let filter = PatioFilter {
                nome_patio: name,
                status: inactive.then_some(PatioStatus::Inactive),
            };
            let page = api
                .patios()
                .search(&filter, PageRequest::ALL)
                .await
                .map_err(user_error)?;
            for patio in page.content {
                println!("{}\t{}\t{}", patio.id_patio, patio.status, patio.nome_patio);
            }
            Ok(())
        }
        PatioCommand::Show { id } => {
            let patio = api.patios().get(PatioId(id)).await.map_err(user_error)?;
            print_json(&patio)
        }
        PatioCommand::Export { id } => {
            let mut editor = PatioEditor::with_ttl(Arc::new(api.clone()), PatioId(id), ttl);
            let wizard = editor.wizard().await.map_err(user_error)?;
            print_json(wizard.data())
        }
        PatioCommand::Create { file } => {
            let mut wizard = Wizard::with_data(read_json::<WizardData>(&file)?);
            let patio = create_patio(api, &mut wizard).await.map_err(submit_error)?;
            println!("{}", created_message(&patio));
            Ok(())
        }
        PatioCommand::Save { id, file } => {
            let data = read_json::<WizardData>(&file)?;
            let mut editor = PatioEditor::with_ttl(Arc::new(api.clone()), PatioId(id), ttl);
            let mut wizard = editor.wizard().await.map_err(user_error)?;
            *wizard.data_mut() = data;
            let outcome = editor.save_wizard(&mut wizard).await.map_err(submit_error)?;
            println!("{}", outcome.summary_message());
            Ok(())
        }
    }
}

async fn run_boxes(api: &ApiClient, ttl: Duration, command: BoxesCommand) -> Result<()> {
    match command {
        BoxesCommand::List { patio } => {
            let patio = api.patios().get(PatioId(patio)).await.map_err(user_error)?;
            let boxes = api
                .boxes()
                .list_by_patio(patio.id_patio, patio.status, PageRequest::ALL)
                .await
                .map_err(user_error)?;
            for parking_box in boxes.content {
                println!("{}\t{}\t{}", parking_box.id_box, parking_box.status, parking_box.nome);
            }
            Ok(())
        }
        BoxesCommand::Sync(args) => {
            let drafts = match &args.file {
                Some(file) => read_json::<Vec<BoxDraft>>(file)?,
                None => args.names.iter().map(BoxDraft::named).collect(),
            };
            let mut editor = PatioEditor::with_ttl(Arc::new(api.clone()), PatioId(args.patio), ttl);
            editor.load().await.map_err(user_error)?;
            let report = editor.save_boxes(&drafts).await.map_err(submit_error)?;
            println!("{}", report.summary_message());
            Ok(())
        }
        BoxesCommand::Generate { prefix, quantity } => {
            let message = api
                .boxes()
                .generate_batch(&prefix, quantity)
                .await
                .map_err(user_error)?;
            println!("{message}");
            Ok(())
        }
    }
}

async fn run_parking(api: &ApiClient, command: ParkingCommand) -> Result<()> {
    match command {
        ParkingCommand::Active { patio: Some(patio) } => {
            let records = api
                .parking()
                .list_active_by_patio(PatioId(patio))
                .await
                .map_err(user_error)?;
            print_json(&records)
        }
        ParkingCommand::Active { patio: None } => {
            let page = api
                .parking()
                .list_active(PageRequest::ALL)
                .await
                .map_err(user_error)?;
            print_json(&page.content)
        }
        ParkingCommand::Find { plate } => {
            match api.parking().find_active_by_plate(&plate).await.map_err(user_error)? {
                Some(record) => print_json(&record),
                None => {
                    println!("Veículo {plate} não está estacionado.");
                    Ok(())
                }
            }
        }
    }
}

async fn run_notifications(api: &ApiClient, command: NotificationsCommand) -> Result<()> {
    match command {
        NotificationsCommand::List { unread } => {
            let filter = NotificationFilter {
                lida: unread.then_some(false),
                ..NotificationFilter::default()
            };
            let page = api
                .notifications()
                .list(&filter, PageRequest::ALL)
                .await
                .map_err(user_error)?;
            print_json(&page.content)
        }
        NotificationsCommand::Read { id } => {
            api.notifications()
                .mark_read(NotificationId(id))
                .await
                .map_err(user_error)?;
            Ok(())
        }
        NotificationsCommand::Watch => watch(api.subscribe_notifications()?).await,
    }
}

async fn watch<T: Serialize>(mut events: EventSubscription<T>) -> Result<()> {
    while let Some(event) = events.next().await {
        print_json(&event?)?;
    }
    info!("yardctl: stream closed");
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn user_error(err: client_core::ClientError) -> anyhow::Error {
    anyhow::anyhow!(err.display_message())
}

fn submit_error(err: SubmitError) -> anyhow::Error {
    if let SubmitError::Invalid(invalid) = &err {
        for (field, message) in &invalid.errors {
            eprintln!("{}: {field}: {message}", invalid.step);
        }
    }
    anyhow::anyhow!(err.display_message())
}
