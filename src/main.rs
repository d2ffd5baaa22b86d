use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crm_client::auth::{LoginPayload, DEFAULT_TOKEN_KEY};
use crm_client::config::TOKEN_KEY_ENV;
use crm_client::controller::{LEAD_FILTER_KEY, RESERVATION_FILTER_KEY};
use crm_client::storage::save_json;
use crm_client::{
    logging, ClientConfig, CrmClient, Fetched, FileStore, FilterController, Filterable,
    KeyValueStore, ListParams, LocationCascade, LocationLevel, Lookup, MemoryHistory, Notifier,
    SelectOption, SortDirection, StatusFilter, TracingNotifier,
};
use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "crm")]
#[command(about = "Back office GraphQL client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GraphQL endpoint URL
    #[arg(long, env = "CRM_GRAPHQL_ENDPOINT")]
    endpoint: Option<String>,

    /// JSON file holding the login payload and saved list filters
    #[arg(long, default_value = ".crm-state.json", env = "CRM_STATE_FILE")]
    state_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the login token used for the Authorization header
    Token { token: String },
    /// List leads through the list filter
    Leads(ListArgs),
    /// Show one lead
    Lead { id: String },
    /// List reservations through the list filter
    Reservations(ListArgs),
    /// Show one reservation
    Reservation { id: String },
    /// Print the options of a lookup entity
    Lookup { entity: Lookup },
    /// Walk the location cascade and print the deepest level's options
    Locations {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        county: Option<String>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Query string of the current list URL (e.g. `pageSize=20&orderBy=fullName`)
    #[arg(long, default_value = "")]
    query: String,

    #[arg(long)]
    title: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Role ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,

    /// Aktif or Pasif
    #[arg(long)]
    status: Option<StatusFilter>,

    #[arg(long)]
    order_by: Option<String>,

    #[arg(long)]
    order_direction: Option<SortDirection>,

    #[arg(long)]
    page_size: Option<usize>,

    #[arg(long)]
    page_index: Option<usize>,

    /// Reset the filter instead of applying edits
    #[arg(long)]
    clear: bool,
}

impl ListArgs {
    fn has_edits(&self) -> bool {
        self.title.is_some()
            || self.start.is_some()
            || self.end.is_some()
            || !self.roles.is_empty()
            || self.status.is_some()
    }

    /// Current params overlaid with the ones given, `None` when none were
    fn list_params(&self, current: ListParams) -> Option<ListParams> {
        if self.order_by.is_none()
            && self.order_direction.is_none()
            && self.page_size.is_none()
            && self.page_index.is_none()
        {
            return None;
        }
        Some(ListParams {
            order_by: self.order_by.clone().or(current.order_by),
            order_direction: self.order_direction.or(current.order_direction),
            page_size: self.page_size.or(current.page_size),
            page_index: self.page_index.or(current.page_index),
        })
    }

    fn location(&self, view: &str) -> Result<Url> {
        let mut url = Url::parse("http://localhost/")?.join(view)?;
        if !self.query.trim().is_empty() {
            url.set_query(Some(self.query.trim().trim_start_matches('?')));
        }
        Ok(url)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level, cli.json_logs);
    debug!("crm v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&cli.state_file));

    if let Commands::Token { token } = &cli.command {
        let key = std::env::var(TOKEN_KEY_ENV).unwrap_or_else(|_| DEFAULT_TOKEN_KEY.to_string());
        save_json(
            store.as_ref(),
            &key,
            &LoginPayload {
                token: Some(token.clone()),
            },
        )?;
        info!(state_file = %cli.state_file.display(), "token stored");
        return Ok(());
    }

    let config = ClientConfig::from_env_with_endpoint(cli.endpoint.as_deref())
        .context("loading client configuration")?;
    let client = CrmClient::from_store(&config, store.clone())?;
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    match cli.command {
        Commands::Token { .. } => {}
        Commands::Leads(args) => {
            let roles = client
                .options_or_empty(Lookup::Roles, notifier.as_ref())
                .await;
            let leads = client.leads().await?;
            run_list("leads", LEAD_FILTER_KEY, leads, roles, &args, store, notifier)?;
        }
        Commands::Lead { id } => {
            let lead = client
                .lead(&id)
                .await?
                .with_context(|| format!("lead `{id}` not found"))?;
            print_json(&lead)?;
        }
        Commands::Reservations(args) => {
            let reservations = client.reservations().await?;
            run_list(
                "reservations",
                RESERVATION_FILTER_KEY,
                reservations,
                Vec::new(),
                &args,
                store,
                notifier,
            )?;
        }
        Commands::Reservation { id } => {
            let reservation = client
                .reservation(&id)
                .await?
                .with_context(|| format!("reservation `{id}` not found"))?;
            print_json(&reservation)?;
        }
        Commands::Lookup { entity } => {
            let options = client.lookup_options(entity).await?;
            warn_partial(&options, notifier.as_ref());
            print_options(&options.data);
        }
        Commands::Locations {
            country,
            city,
            county,
        } => run_locations(&client, [country, city, county]).await?,
    }

    Ok(())
}

/// Drive the list filter the way the list page does
fn run_list<R>(
    view: &str,
    storage_key: &str,
    fetched: Fetched<Vec<R>>,
    role_options: Vec<SelectOption>,
    args: &ListArgs,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
) -> Result<()>
where
    R: Filterable + Clone + Serialize,
{
    warn_partial(&fetched, notifier.as_ref());

    let history = Arc::new(MemoryHistory::new(args.location(view)?));
    let mut controller = FilterController::new(storage_key, store, history, notifier);
    controller.set_role_options(role_options);
    controller.enter();
    controller.set_records(fetched.data);

    if args.clear {
        controller.open();
        controller.clear()?;
    } else if args.has_edits() {
        controller.open();
        if let Some(title) = &args.title {
            controller.set_title(title.as_str())?;
        }
        if args.start.is_some() || args.end.is_some() {
            controller.set_date_range(args.start, args.end)?;
        }
        if !args.roles.is_empty() {
            let roles: Vec<SelectOption> = controller
                .role_options()
                .iter()
                .filter(|option| args.roles.contains(&option.value))
                .cloned()
                .collect();
            if roles.len() != args.roles.len() {
                warn_unknown_roles(&args.roles, &roles);
            }
            controller.set_roles(roles)?;
        }
        if args.status.is_some() {
            controller.set_status(args.status)?;
        }
        let visible = controller.submit()?;
        debug!(view, visible, "filter applied");
    }

    if let Some(params) = args.list_params(controller.list_params()) {
        controller.set_list_params(&params)?;
    }

    let page = controller.page();
    let location = controller.location();
    print_json(&json!({
        "items": page.items,
        "pageInfo": {
            "pageIndex": page.page_info.page_index,
            "pageSize": page.page_info.page_size,
            "totalCount": page.page_info.total_count,
            "hasNextPage": page.page_info.has_next_page,
            "hasPreviousPage": page.page_info.has_previous_page,
        },
        "query": location.query().unwrap_or_default(),
    }))
}

fn warn_unknown_roles(requested: &[String], resolved: &[SelectOption]) {
    let unknown: Vec<&str> = requested
        .iter()
        .filter(|id| !resolved.iter().any(|option| &option.value == *id))
        .map(String::as_str)
        .collect();
    tracing::warn!(?unknown, "ignoring unknown role ids");
}

async fn run_locations(client: &CrmClient, path: [Option<String>; 3]) -> Result<()> {
    let mut cascade = LocationCascade::new();
    let ticket = cascade.start();
    cascade.load(&ticket, client).await?;

    let mut level = LocationLevel::Country;
    for id in path.into_iter().map_while(|id| id) {
        let option = cascade
            .options(level)
            .iter()
            .find(|option| option.value == id)
            .cloned()
            .with_context(|| format!("no {level} entry with id `{id}`"))?;
        let Some(ticket) = cascade.select(level, Some(option)) else {
            break;
        };
        cascade.load(&ticket, client).await?;
        level = ticket.level;
    }

    print_options(cascade.options(level));
    Ok(())
}

fn warn_partial<T>(fetched: &Fetched<T>, notifier: &dyn Notifier) {
    for error in &fetched.errors {
        notifier.warn(&error.to_string());
    }
}

fn print_options(options: &[SelectOption]) {
    for option in options {
        println!("{}\t{}", option.value, option.label);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
