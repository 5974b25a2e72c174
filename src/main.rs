use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dims::app::App;
use dims::config::Config;
use dims::constants::HEALTH_CHECK_TIMEOUT_SECS;
use dims::protocol::sign_url;
use dims::server::{self, ServerConfig};
use dims::signing::{decrypt_url, derive_key, encrypt_url};

/// dims - signed on-the-fly image transformation gateway built with Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "dims")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the image server
    Serve {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bind address (overrides config and DIMS_BIND_ADDRESS)
        #[arg(long)]
        bind: Option<String>,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,

        /// Enable development mode (signatures are not enforced)
        #[arg(long)]
        dev: bool,

        /// Daemon mode
        #[arg(short = 'd', long)]
        daemon: bool,
    },

    /// Sign a v4 or v5 URL. For v4 URLs put any 7 characters in the signature position
    Sign {
        image_url: String,

        /// Path to the key file
        #[arg(long, conflicts_with = "key_from_stdin")]
        key_file: Option<PathBuf>,

        /// Read the key from standard input
        #[arg(long)]
        key_from_stdin: bool,

        /// Replace `url` with an encrypted `eurl` (v5)
        #[arg(long)]
        encrypt: bool,
    },

    /// Encrypt a source URL for use as `eurl`
    Encrypt { url: String },

    /// Decrypt an `eurl` value
    Decrypt { url: String },

    /// Check the local server's /healthz endpoint
    Health,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve {
            config,
            bind,
            debug,
            dev,
            daemon,
        } => serve(config, bind, debug, dev, daemon),
        Command::Sign {
            image_url,
            key_file,
            key_from_stdin,
            encrypt,
        } => sign(&image_url, key_file, key_from_stdin, encrypt),
        Command::Encrypt { url } => {
            let config = load_config(None)?;
            let encrypted = encrypt_url(&derive_key(config.signing_key()), &url)
                .context("failed to encrypt")?;
            println!("Encrypted URL: {}", encrypted);
            Ok(())
        }
        Command::Decrypt { url } => {
            let config = load_config(None)?;
            let decrypted = decrypt_url(&derive_key(config.signing_key()), &url)
                .context("failed to decrypt")?;
            println!("Decrypted URL: {}", decrypted);
            Ok(())
        }
        Command::Health => health(),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load(path.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")
}

fn serve(
    path: Option<PathBuf>,
    bind: Option<String>,
    debug: bool,
    dev: bool,
    daemon: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(path)?;
    if let Some(bind) = bind {
        config.bind_address = bind;
    }
    config.debug_mode |= debug;
    config.development_mode |= dev;

    dims::logging::init_subscriber(config.debug_mode).expect("Failed to initialize logging subsystem");

    config.validate().map_err(anyhow::Error::msg)?;

    tracing::info!(
        bind_address = %config.bind_address,
        development_mode = config.development_mode,
        default_backend = %config.source.default,
        "Configuration loaded successfully"
    );

    let mut server_config = ServerConfig::from_config(&config);
    server_config.daemon = daemon;

    let app = Arc::new(App::new(config)?);
    let server = server::build(app, &server_config)?;

    // Run server forever (blocks until shutdown)
    server.run_forever();
}

fn read_signing_key(key_file: Option<PathBuf>, key_from_stdin: bool) -> anyhow::Result<Option<String>> {
    let key = if let Some(path) = key_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read key file {}", path.display()))?
    } else if key_from_stdin {
        let mut key = String::new();
        std::io::stdin()
            .read_to_string(&mut key)
            .context("failed to read key from stdin")?;
        key
    } else {
        return Ok(None);
    };

    Ok(Some(key.trim_matches(|c| c == '\n' || c == '\r' || c == ' ').to_string()))
}

fn sign(
    image_url: &str,
    key_file: Option<PathBuf>,
    key_from_stdin: bool,
    encrypt: bool,
) -> anyhow::Result<()> {
    let signing_key = match read_signing_key(key_file, key_from_stdin)? {
        Some(key) => key,
        None => load_config(None)?.signing_key().to_string(),
    };
    if signing_key.is_empty() {
        println!("Signing key is required. Use --key-file or --key-from-stdin to provide a key. Or set the DIMS_SIGNING_KEY environment variable.");
        return Ok(());
    }

    let signed = sign_url(image_url, &signing_key, encrypt)?;

    println!("Image to be transformed:");
    println!("\n{}\n", signed.image_url);
    println!("Transformation commands found:\n");
    for command in &signed.commands {
        println!("{}('{}')", command.name, command.args);
    }
    println!("\n{}", signed.url);
    Ok(())
}

fn health() -> anyhow::Result<()> {
    let config = load_config(None)?;
    let url = if config.bind_address.starts_with(':') {
        format!("http://localhost{}/healthz", config.bind_address)
    } else {
        format!("http://{}/healthz", config.bind_address)
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let status = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .build()?;
        let response = client.get(&url).send().await?;
        Ok::<_, reqwest::Error>(response.status())
    });

    match status {
        Ok(reqwest::StatusCode::OK) => Ok(()),
        Ok(status) => bail!("health check failed: status {}", status),
        Err(err) => bail!("health check failed: {}", err),
    }
}
