use crate::auth::{Credentials, Signup};
use crate::catalog::{self, SurfaceKind};
use crate::client::Client;
use crate::config::Config;
use crate::field::{Field, FieldId};
use crate::filter::{filter_fields, FilterSelection};
use crate::form::FieldForm;
use crate::logging::{setup_logging, LogLevel};
use crate::presentation::{field_card, fields_table};
use crate::services;
use crate::session::{Session, SessionStore};
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::debug;

fn default(path: &Path) -> String {
    format!("[default: {}]", path.as_os_str().to_string_lossy())
}

/// Find soccer fields around Montreal
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, value_name = "DIR", help = default(&Config::default_dirs().state))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    #[arg(short, long = "config", value_name = "FILE", help = default(&Config::default_path()))]
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Base URL of the FieldFinder API
    #[arg(short, long, value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// [default: warn]
    #[arg(short, long)]
    #[serde(skip)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    #[serde(skip)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search and filter fields
    Search(SearchArgs),
    /// Show everything about one field
    Show { id: FieldId },
    /// Show the featured fields
    Featured,
    /// List the known boroughs, formats and surface types
    Options,
    /// Create a user account
    Signup,
    /// Log in with a user account
    Login,
    /// Forget the logged in user
    Logout,
    /// Show who is logged in
    Whoami,
    /// Manage fields
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Open the config file in your editor
    EditConfig,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Matches the name, address or borough
    #[arg(default_value = "")]
    term: String,
    /// Surface type, e.g. Natural, Artificial or Indoor
    #[arg(short = 't', long = "type", default_value = crate::filter::ALL)]
    surface_type: String,
    /// Format, e.g. 5v5, 7v7 or 11v11
    #[arg(short, long, default_value = crate::filter::ALL)]
    size: String,
    #[arg(long)]
    lighting: Option<bool>,
    #[arg(long)]
    parking: Option<bool>,
    #[arg(long)]
    accessibility: Option<bool>,
    #[arg(short, long, default_value = crate::filter::ALL_BOROUGHS)]
    borough: String,
    /// Print a card per field instead of a table
    #[arg(short, long)]
    details: bool,
    /// Print the matching fields as JSON
    #[arg(long, conflicts_with = "details")]
    json: bool,
}

impl SearchArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection {
            surface_type: FilterSelection::parse_type(&self.surface_type),
            size: FilterSelection::parse_size(&self.size),
            lighting: self.lighting,
            parking: self.parking,
            accessibility: self.accessibility,
            borough: FilterSelection::parse_borough(&self.borough),
        }
    }
}

#[derive(Debug, Subcommand)]
enum AdminCommands {
    /// Log in as an admin
    Login,
    /// Forget the admin session
    Logout,
    /// Show the logged in admin
    Whoami,
    /// List every field
    List,
    /// Create a field
    Create(FieldArgs),
    /// Change a field. Only the given values are changed.
    Edit {
        id: FieldId,
        #[command(flatten)]
        field: FieldArgs,
    },
    /// Delete a field
    Delete {
        id: FieldId,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Default, Args)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<String>,
    #[arg(long = "type")]
    surface_type: Option<String>,
    #[arg(long)]
    format: Option<String>,
    #[arg(long)]
    borough: Option<String>,
    #[arg(long)]
    lighting: Option<bool>,
    #[arg(long)]
    parking: Option<bool>,
    #[arg(long)]
    accessibility: Option<bool>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Comma separated
    #[arg(long)]
    amenities: Option<String>,
    /// Comma separated
    #[arg(long)]
    photos: Option<String>,
}

impl FieldArgs {
    fn apply(self, form: &mut FieldForm) {
        let text = [
            (self.name, &mut form.name),
            (self.address, &mut form.address),
            (self.latitude, &mut form.latitude),
            (self.longitude, &mut form.longitude),
            (self.surface_type, &mut form.surface_type),
            (self.format, &mut form.format),
            (self.borough, &mut form.borough),
            (self.phone, &mut form.phone),
            (self.website, &mut form.website),
            (self.description, &mut form.description),
            (self.amenities, &mut form.amenities),
            (self.photos, &mut form.photos),
        ];
        for (value, target) in text {
            if let Some(value) = value {
                *target = value;
            }
        }
        let flags = [
            (self.lighting, &mut form.lighting),
            (self.parking, &mut form.parking),
            (self.accessibility, &mut form.accessibility),
        ];
        for (value, target) in flags {
            if let Some(value) = value {
                *target = value;
            }
        }
    }
}

struct Context {
    config: Config,
    client: Client,
    store: SessionStore,
    session: Session,
}

impl Context {
    fn fields(&self) -> Result<Vec<Field>> {
        services::load_fields(&self.client, &self.config.normalization())
    }
}

pub fn cli() -> Result<()> {
    let args = Cli::parse();

    let mut config = Config::from_cli(&args)?;
    if let Some(level) = args.log_level {
        config.main.logging.console_level = level;
    }
    let _guard = setup_logging(&config.main.logging, &config.main.state_dir);
    debug!("Command line arguments: {:#?}", &args);
    debug!("Config: {:#?}", &config);

    let store = config.session_store();
    let session = store.load();
    let mut ctx = Context {
        client: config.client(),
        store,
        session,
        config,
    };

    match args.command {
        Some(Commands::Search(search)) => search_fields(&ctx, &search)?,
        Some(Commands::Show { id }) => show_field(&ctx, id)?,
        Some(Commands::Featured) => featured(&ctx)?,
        Some(Commands::Options) => print_options(),
        Some(Commands::Signup) => signup(&mut ctx)?,
        Some(Commands::Login) => login(&mut ctx)?,
        Some(Commands::Logout) => logout(&mut ctx)?,
        Some(Commands::Whoami) => whoami(&ctx),
        Some(Commands::Admin(command)) => admin(&mut ctx, command)?,
        Some(Commands::EditConfig) => edit_config(&ctx.config)?,
        None => search_fields(&ctx, &SearchArgs::parse_from(["search"]))?,
    }
    Ok(())
}

#[derive(Parser)]
struct SearchOnly {
    #[command(flatten)]
    search: SearchArgs,
}

impl SearchArgs {
    fn parse_from<const N: usize>(args: [&str; N]) -> Self {
        SearchOnly::parse_from(args).search
    }
}

fn search_fields(ctx: &Context, args: &SearchArgs) -> Result<()> {
    let fields = ctx.fields()?;
    let selection = args.selection();
    debug!("Filtering {} fields with {:?}", fields.len(), selection);
    let matches = filter_fields(&fields, &selection, &args.term);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else if matches.is_empty() {
        println!("No fields match your search");
    } else if args.details {
        for field in &matches {
            println!("{}\n", field_card(field));
        }
    } else {
        println!("{}", fields_table(matches.iter().copied()));
        println!("{} of {} fields", matches.len(), fields.len());
    }
    Ok(())
}

fn show_field(ctx: &Context, id: FieldId) -> Result<()> {
    let fields = ctx.fields()?;
    let field = services::find_field(&fields, id)?;
    println!("{}", field_card(field));
    Ok(())
}

fn featured(ctx: &Context) -> Result<()> {
    let fields = ctx.fields()?;
    let main = &ctx.config.main;
    let showcase = services::showcase_fields(&fields, &main.featured_fields, main.showcase_count);
    for field in showcase {
        println!("{}\n", field_card(field));
    }
    Ok(())
}

fn print_options() {
    println!("Surface types:");
    for kind in SurfaceKind::iter() {
        println!("  {} {kind}", kind.icon());
    }
    println!("Formats:");
    for format in catalog::FORMATS {
        println!("  {format}");
    }
    println!("Boroughs:");
    for borough in catalog::BOROUGHS {
        println!("  {borough}");
    }
}

fn prompt_credentials() -> Result<Credentials> {
    let email = Text::new("Email").prompt()?;
    let password = Password::new("Password").without_confirmation().prompt()?;
    Ok(Credentials::for_login(&email, &password)?)
}

fn signup(ctx: &mut Context) -> Result<()> {
    let full_name = Text::new("Full name").prompt()?;
    let email = Text::new("Email").prompt()?;
    let password = Password::new("Password").without_confirmation().prompt()?;
    let confirmation = Password::new("Confirm password")
        .without_confirmation()
        .prompt()?;
    let details = Signup::new(&full_name, &email, &password, &confirmation)?;
    let user = services::signup(&ctx.client, &ctx.store, &mut ctx.session, &details)?;
    println!("Welcome, {}", user.display_name());
    Ok(())
}

fn login(ctx: &mut Context) -> Result<()> {
    let credentials = prompt_credentials()?;
    let user = services::login(&ctx.client, &ctx.store, &mut ctx.session, &credentials)?;
    println!("Logged in as {}", user.display_name());
    Ok(())
}

fn logout(ctx: &mut Context) -> Result<()> {
    match services::logout(&ctx.store, &mut ctx.session)? {
        Some(user) => println!("Logged out {}", user.display_name()),
        None => println!("Not logged in"),
    }
    Ok(())
}

fn whoami(ctx: &Context) {
    match &ctx.session.user {
        Some(s) => println!(
            "{} <{}> since {}",
            s.user.display_name(),
            s.user.email,
            s.logged_in_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Not logged in"),
    }
}

fn admin(ctx: &mut Context, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Login => {
            let credentials = prompt_credentials()?;
            let admin =
                services::admin_login(&ctx.client, &ctx.store, &mut ctx.session, &credentials)?;
            println!("Logged in as admin {}", admin.full_name);
        }
        AdminCommands::Logout => match services::admin_logout(&ctx.store, &mut ctx.session)? {
            Some(admin) => println!("Logged out admin {}", admin.full_name),
            None => println!("No admin logged in"),
        },
        AdminCommands::Whoami => {
            services::restore_admin(&ctx.client, &ctx.store, &mut ctx.session)?;
            let admin = ctx
                .session
                .admin()
                .ok_or_else(|| anyhow!("No admin logged in"))?;
            println!("{} <{}>", admin.full_name, admin.email);
        }
        AdminCommands::List => {
            services::restore_admin(&ctx.client, &ctx.store, &mut ctx.session)?;
            let fields = ctx.fields()?;
            println!("{}", fields_table(&fields));
            println!("{} fields", fields.len());
        }
        AdminCommands::Create(args) => {
            let token = services::restore_admin(&ctx.client, &ctx.store, &mut ctx.session)?;
            let mut form = FieldForm::default();
            args.apply(&mut form);
            let fields =
                services::save_field(&ctx.client, &token, &form, &ctx.config.normalization())?;
            println!("Field created, {} fields total", fields.len());
        }
        AdminCommands::Edit { id, field } => {
            let token = services::restore_admin(&ctx.client, &ctx.store, &mut ctx.session)?;
            let stored = services::stored_field(&ctx.client, id)?;
            let mut form = FieldForm::from_data(&stored);
            field.apply(&mut form);
            services::save_field(&ctx.client, &token, &form, &ctx.config.normalization())?;
            println!("Field {id} updated");
        }
        AdminCommands::Delete { id, yes } => {
            let token = services::restore_admin(&ctx.client, &ctx.store, &mut ctx.session)?;
            let fields = ctx.fields()?;
            let field = services::find_field(&fields, id)?;
            let confirmed = yes
                || Confirm::new(&format!("Really delete {field}?"))
                    .with_default(false)
                    .prompt()?;
            if confirmed {
                services::delete_field(&ctx.client, &token, id, &ctx.config.normalization())?;
                println!("Field {id} deleted");
            }
        }
    }
    Ok(())
}

fn edit_config(config: &Config) -> Result<()> {
    if !config.config_path.exists() {
        config.write_config_file()?;
    }
    edit::edit_file(&config.config_path)?;
    Ok(())
}
