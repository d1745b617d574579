use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use exhibilo_site::content::category_title;
use exhibilo_site::{
    find_project, project_link, projects_in_category, relay, ContactClient, ContactForm,
    ContentClient, LogTransport, MailTransport, RelayState, SendmailTransport, SiteConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "exhibilo-site", version, about = "Exhibilo contact relay and content tools")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "EXHIBILO_SITE_CONFIG")]
    config: Option<PathBuf>,

    /// Content backend base URL; enables the backend
    #[arg(long, global = true, env = "EXHIBILO_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the contact relay
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Log messages instead of handing them to sendmail
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a content section as JSON
    Content {
        #[arg(value_enum)]
        section: Section,

        /// Only projects in this category slug (`todos` for all)
        #[arg(long)]
        category: Option<String>,

        /// Only the project with this id
        #[arg(long)]
        id: Option<String>,
    },
    /// Submit the contact form to the backend
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Section {
    Services,
    Projects,
    Testimonials,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = SiteConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend_url = Some(url);
        config.use_backend = true;
    }

    match cli.command {
        Command::Serve { bind, dry_run } => {
            let addr = bind.unwrap_or(config.bind);
            let transport: Arc<dyn MailTransport> = if dry_run {
                Arc::new(LogTransport)
            } else {
                Arc::new(SendmailTransport::new(config.mail.sendmail.clone()))
            };
            let origins = config.origin_headers()?;
            info!(origins = ?config.allowed_origins, dry_run, "starting contact relay");

            let app = relay::router(RelayState::new(transport, config.mail), origins);
            relay::serve(addr, app)
                .await
                .with_context(|| format!("contact relay on {addr} failed"))?;
        }
        Command::Content {
            section,
            category,
            id,
        } => {
            let client = ContentClient::new(config.backend_url, config.use_backend);
            let json = match section {
                Section::Services => serde_json::to_string_pretty(&client.services().await)?,
                Section::Testimonials => {
                    serde_json::to_string_pretty(&client.testimonials().await)?
                }
                Section::Projects => {
                    let projects = client.projects().await;
                    if let Some(id) = id {
                        let project = find_project(&projects, &id)
                            .with_context(|| format!("no project with id {id}"))?;
                        info!(link = %project_link(project), "project page");
                        serde_json::to_string_pretty(project)?
                    } else if let Some(slug) = category {
                        info!(title = %category_title(&projects, &slug), "category");
                        serde_json::to_string_pretty(&projects_in_category(&projects, &slug))?
                    } else {
                        serde_json::to_string_pretty(&projects)?
                    }
                }
            };
            println!("{json}");
        }
        Command::Contact {
            name,
            company,
            email,
            phone,
            industry,
            message,
        } => {
            let form = ContactForm {
                name,
                company,
                email,
                phone,
                industry,
                message,
            };
            let missing = form.missing_fields();
            if !missing.is_empty() {
                bail!("missing required fields: {}", missing.join(", "));
            }
            let Some(base) = config.backend_url.as_deref() else {
                bail!("no backend configured: set backend_url or pass --backend-url");
            };

            let outcome = ContactClient::new(base).submit(&form).await;
            if !outcome.success {
                bail!("contact submission failed: {}", outcome.message);
            }
            println!("{}", outcome.message);
        }
    }
    Ok(())
}
