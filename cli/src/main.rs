use std::{
    fs::File,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use housecall::*;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// ClickHouse over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    /// TOML file with named connections. Replaces the individual flags below.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Connection to use from the config file instead of its default
    #[arg(long, requires = "config")]
    connection: Option<String>,
    #[arg(long, env = "CH_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "CH_PORT", default_value_t = 8123)]
    port: u16,
    #[arg(long, env = "CH_DATABASE", default_value = "default")]
    database: String,
    #[arg(long, env = "CH_USERNAME", default_value = "default")]
    user: String,
    #[arg(long, env = "CH_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long)]
    https: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server answers
    Ping,
    /// Run a read and print the result
    Select(SelectArgs),
    /// Run a statement that returns nothing
    Write(WriteArgs),
    /// Upload a file into a table
    InsertStream(InsertStreamArgs),
}

#[derive(Debug, Args)]
struct SelectArgs {
    /// Output format of the result
    #[arg(short, long, default_value = "TabSeparated")]
    format: String,
    /// The query to run. If empty, stdin will be used.
    query: Option<String>,
}

#[derive(Debug, Args)]
struct WriteArgs {
    /// The statement to run. If empty, stdin will be used.
    statement: Option<String>,
}

#[derive(Debug, Args)]
struct InsertStreamArgs {
    /// Target table
    table: String,
    /// File to upload
    file: PathBuf,
    /// Input format of the file
    #[arg(short, long, default_value = "CSV")]
    format: String,
    /// Compress the upload
    #[arg(long)]
    gzip: bool,
}

fn get_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn connect(args: &ConnectionArgs) -> Result<HttpTransport> {
    let connection = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let config = ClientConfig::from_toml_str(&text)?;
            match &args.connection {
                Some(name) => config.connection(name)?.clone(),
                None => config.default_connection()?.clone(),
            }
        }
        None => ConnectionConfig {
            host: args.host.clone(),
            port: args.port,
            database: args.database.clone(),
            username: args.user.clone(),
            password: args.password.clone(),
            ..ConnectionConfig::default()
        },
    };
    let mut transport = Client::connect_with(&connection)?.into_transport();
    transport.settings_mut().https(args.https);
    Ok(transport)
}

async fn ping(transport: &HttpTransport) -> Result<()> {
    if !transport.ping().await? {
        bail!("{} did not answer Ok.", transport.uri());
    }
    println!("Ok.");
    Ok(())
}

async fn select(transport: &HttpTransport, args: SelectArgs) -> Result<()> {
    let query = args.query.map(Ok).unwrap_or_else(get_stdin)?;
    let mut statement = StatementText::new(query)?;
    statement.set_format(&args.format);
    let sql = statement.to_sql();
    let stdout = StreamRead::new(io::stdout());
    transport.stream_read(stdout, &sql, &[]).await?;
    io::stdout().flush()?;
    Ok(())
}

async fn write(transport: &HttpTransport, args: WriteArgs) -> Result<()> {
    let statement = args.statement.map(Ok).unwrap_or_else(get_stdin)?;
    transport.write(&statement, &[], true).await?;
    Ok(())
}

async fn insert_stream(transport: &HttpTransport, args: InsertStreamArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    let mut upload = StreamWrite::new(file);
    if args.gzip {
        upload = upload.apply_gzip();
    }
    let sql = format!("insert into {} format {}", args.table, args.format);
    let statement = transport.stream_write(upload, &sql, &[]).await?;
    if let Some(written) = statement.headers().get(SUMMARY_HEADER) {
        tracing::info!(summary = ?written, "upload finished");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Cli::parse();
    let transport = connect(&args.connection)?;
    match args.command {
        Command::Ping => ping(&transport).await,
        Command::Select(args) => select(&transport, args).await,
        Command::Write(args) => write(&transport, args).await,
        Command::InsertStream(args) => insert_stream(&transport, args).await,
    }
}
