//! CLI entry point for taglog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taglog::server::ServerOptions;
use taglog::Blog;

#[derive(Parser)]
#[command(name = "taglog")]
#[command(author = "Jeongtae Kim")]
#[command(version)]
#[command(about = "A static blog generator with a config-driven tag taxonomy", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// File name without extension (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,

        /// Include posts marked as draft
        #[arg(long)]
        drafts: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,

        /// Include posts marked as draft
        #[arg(long)]
        drafts: bool,
    },

    /// Remove the public folder
    Clean,

    /// List site information
    List {
        /// post, page, tag, group, series or portfolio
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Search post titles
    Search {
        /// Terms that must all appear in the title
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "taglog=debug,info"
    } else {
        "taglog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            taglog::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New { title, slug } => {
            let blog = Blog::new(&base_dir)?;
            let path = blog.new_post(&title, slug.as_deref())?;
            println!("Created: {}", path.display());
        }

        Commands::Generate { watch, drafts } => {
            let mut blog = Blog::new(&base_dir)?;
            blog.include_drafts = drafts;
            tracing::info!("Generating static files...");
            blog.generate()?;
            println!("Generated successfully!");

            if watch {
                taglog::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
            drafts,
        } => {
            let mut blog = Blog::new(&base_dir)?;
            blog.include_drafts = drafts;
            let options = ServerOptions {
                ip,
                port,
                watch: !r#static,
                open,
            };
            tracing::info!("Starting server at {}", options.url());
            taglog::server::start(&blog, &options).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            taglog::commands::list::run(&blog, &r#type)?;
        }

        Commands::Search { query } => {
            let blog = Blog::new(&base_dir)?;
            taglog::commands::search::run(&blog, &query.join(" "))?;
        }

        Commands::Version => {
            println!("taglog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
