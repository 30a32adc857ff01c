use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use models::{EntityKind, Record};
use secrecy::SecretString;
use serde_json::Value;
use services::services::{
    entity::{DeletePolicy, EntityService, RowOutcome},
    export::FsDownloadSink,
    graphql::GraphqlClient,
    notification::TracingNotifier,
    privilege::{AllowAll, PrivilegeCheck, StaticPrivileges},
    screen::EntityScreen,
};
use strum::IntoEnumIterator;
use tracing::info;
use utils::{
    config::{self, ClientConfig},
    tokenize::TokenCodec,
};

#[derive(Parser)]
#[command(name = "agri-admin", version, about = "Manage agricultural master data over GraphQL")]
struct Cli {
    /// GraphQL endpoint URL
    #[arg(long, env = config::ENDPOINT_VAR, global = true)]
    endpoint: Option<String>,

    /// Shared secret for tokenized payloads
    #[arg(long = "secret", env = config::TOKENIZE_VAR, hide_env_values = true, global = true)]
    tokenize_secret: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = config::AUTH_TOKEN_VAR, hide_env_values = true, global = true)]
    auth_token: Option<String>,

    #[arg(long, env = config::TIMEOUT_VAR, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Retries for read queries on transient failures
    #[arg(long, env = config::RETRIES_VAR, default_value_t = 2, global = true)]
    query_retries: usize,

    /// Comma-separated granted privileges; everything is allowed when unset
    #[arg(long, env = "ADMIN_PRIVILEGES", global = true)]
    privileges: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct Target {
    /// Entity name, e.g. category or poultry-house
    #[arg(value_parser = parse_entity)]
    entity: EntityKind,

    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    farm: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known entities
    Entities,
    /// Print one page of rows
    List {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        filter: Option<String>,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a row, or update it when the JSON carries an identifier
    Save {
        #[command(flatten)]
        target: Target,
        /// Form state as a JSON object
        #[arg(long)]
        data: String,
    },
    /// Delete rows by identifier, one request per row
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
        /// Keep going after a failed row instead of stopping
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Download the entity's spreadsheet export
    Export {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Sign a JSON object into a token
    Encode {
        #[arg(long)]
        data: String,
    },
    /// Verify a token and print its payload
    Decode { token: String },
}

fn parse_entity(raw: &str) -> Result<EntityKind, String> {
    EntityKind::from_str(raw).map_err(|_| {
        let known: Vec<String> = EntityKind::iter().map(|k| k.to_string()).collect();
        format!("unknown entity {raw:?}; expected one of: {}", known.join(", "))
    })
}

fn parse_record(raw: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(raw).context("--data is not valid JSON")? {
        Value::Object(record) => Ok(record),
        _ => bail!("--data must be a JSON object"),
    }
}

impl Cli {
    fn secret(&self) -> Result<SecretString> {
        self.tokenize_secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from)
            .with_context(|| format!("{} is not set (use --secret)", config::TOKENIZE_VAR))
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let endpoint = self
            .endpoint
            .as_deref()
            .with_context(|| format!("{} is not set (use --endpoint)", config::ENDPOINT_VAR))?;
        let mut config = ClientConfig::new(config::parse_endpoint(endpoint)?, self.secret()?);
        config.auth_token = self.auth_token.clone().map(SecretString::from);
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.query_retries = self.query_retries;
        Ok(config)
    }

    fn privilege_check(&self) -> Arc<dyn PrivilegeCheck> {
        match &self.privileges {
            Some(raw) => Arc::new(StaticPrivileges::from_csv(raw)),
            None => Arc::new(AllowAll),
        }
    }
}

fn open_screen(cli: &Cli, target: &Target) -> Result<(EntityScreen, Arc<GraphqlClient>)> {
    let config = cli.client_config()?;
    let client = Arc::new(GraphqlClient::new(&config)?);
    let codec = TokenCodec::new(&config.tokenize_secret);
    let service = EntityService::new(client.clone(), codec, target.entity.descriptor());
    let mut screen = EntityScreen::new(service, cli.privilege_check(), Arc::new(TracingNotifier));

    screen.select_company(target.company.clone());
    screen.select_farm(target.farm.clone())?;
    if let Some(missing) = screen.missing_scope() {
        bail!("{} requires --{missing}", target.entity);
    }
    info!(entity = %target.entity, endpoint = %client.endpoint(), "screen ready");
    Ok((screen, client))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn print_table(screen: &EntityScreen) {
    let descriptor = screen.descriptor();
    let page = screen.page();
    let id_field = descriptor.id_field.as_str();
    let fields = descriptor.column_fields(page.rows.first().copied());
    let labels: Vec<&str> = fields
        .iter()
        .map(|f| {
            descriptor
                .columns
                .iter()
                .find(|c| c.field == *f)
                .map_or(*f, |c| c.label.as_str())
        })
        .collect();

    println!("{}\t{}", id_field, labels.join("\t"));
    for row in &page.rows {
        let cells: Vec<String> = fields.iter().map(|f| cell(row.get(*f))).collect();
        println!("{}\t{}", cell(row.get(id_field)), cells.join("\t"));
    }
    println!(
        "-- page {}/{} ({} rows)",
        page.page + 1,
        page.page_count,
        page.total
    );
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Entities => {
            for kind in EntityKind::iter() {
                let descriptor = kind.descriptor();
                println!("{kind}\t{}", descriptor.label);
            }
        }
        Command::List {
            target,
            filter,
            page,
            page_size,
            json,
        } => {
            let (mut screen, _) = open_screen(&cli, target)?;
            if !screen.refresh().await {
                bail!("could not load {}", target.entity);
            }
            screen.set_page_size(*page_size);
            if let Some(filter) = filter {
                screen.set_filter(filter.clone());
            }
            screen.set_page(page.saturating_sub(1));

            if *json {
                let rows: Vec<Value> = screen
                    .page()
                    .rows
                    .into_iter()
                    .map(|r| Value::Object(r.clone()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_table(&screen);
            }
        }
        Command::Save { target, data } => {
            let form = parse_record(data)?;
            let (mut screen, _) = open_screen(&cli, target)?;
            if !screen.submit(form).await {
                bail!("could not save {}", target.entity);
            }
        }
        Command::Delete {
            target,
            ids,
            continue_on_error,
        } => {
            let (mut screen, _) = open_screen(&cli, target)?;
            if !screen.refresh().await {
                bail!("could not load {}", target.entity);
            }
            let policy = if *continue_on_error {
                DeletePolicy::ContinueOnError
            } else {
                DeletePolicy::StopOnFirstError
            };
            let report = screen
                .delete_selected(ids, policy)
                .await
                .with_context(|| format!("could not delete {}", target.entity))?;

            for row in &report.rows {
                let id = row.id.as_deref().unwrap_or("?");
                match &row.outcome {
                    RowOutcome::Deleted => println!("{id}\tdeleted"),
                    RowOutcome::Failed(reason) => println!("{id}\tfailed: {reason}"),
                    RowOutcome::Skipped => println!("{id}\tskipped"),
                }
            }
            if !report.is_complete() {
                bail!(
                    "{} of {} row(s) deleted",
                    report.deleted(),
                    report.rows.len()
                );
            }
        }
        Command::Export { target, out_dir } => {
            let (mut screen, client) = open_screen(&cli, target)?;
            let sink = FsDownloadSink::new(out_dir.clone(), client.http().clone());
            let delivery = screen
                .export(&sink)
                .await
                .with_context(|| format!("could not export {}", target.entity))?;
            println!("{}", delivery.path.display());
        }
        Command::Encode { data } => {
            let codec = TokenCodec::new(&cli.secret()?);
            println!("{}", codec.encode(&parse_record(data)?)?);
        }
        Command::Decode { token } => {
            let codec = TokenCodec::new(&cli.secret()?);
            let payload: Value = codec.decode(token)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::init(&cli.log_level, cli.json_logs)?;
    run(cli).await
}
