//! atcar CLI - inspect AT Protocol CAR repository archives
//!
//! Decodes a repository export, lists its verified blocks and records, and
//! resolves DIDs and AT URIs to their public counterparts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use atcar::{mst, Container};

#[derive(Parser)]
#[command(name = "atcar")]
#[command(about = "A decoder for AT Protocol CAR repository archives")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the root CID and block count of an archive
    Info {
        /// Path to the .car file
        file: PathBuf,
    },

    /// List every block CID in an archive
    Blocks {
        /// Path to the .car file
        file: PathBuf,
    },

    /// List every record key with its value CID
    Records {
        /// Path to the .car file
        file: PathBuf,
    },

    /// Decode one record value as JSON
    Get {
        /// Path to the .car file
        file: PathBuf,
        /// Record key, e.g. "app.bsky.feed.post/3k44deefqdk2g"
        key: String,
    },

    /// Resolve a DID to its handle
    #[cfg(feature = "resolve")]
    Resolve {
        /// The DID, e.g. "did:plc:ewvi7nxzyoun6zhxrhs64oiz"
        did: String,
        /// Identity service to query
        #[arg(short, long, default_value = atcar::DEFAULT_SERVICE_URL)]
        service: String,
    },

    /// Convert an at:// record URI to a public profile URL
    #[cfg(feature = "resolve")]
    Url {
        /// The AT URI
        uri: String,
        /// Identity service to query
        #[arg(short, long, default_value = atcar::DEFAULT_SERVICE_URL)]
        service: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let container = load(&file)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "root": container.root,
                    "blocks": container.len(),
                    "version": atcar::CAR_VERSION,
                }),
            );
        }

        Commands::Blocks { file } => {
            let container = load(&file)?;
            let mut cids: Vec<&String> = container.blocks.keys().collect();
            cids.sort();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": cids.len(),
                    "cids": cids,
                }),
            );
        }

        Commands::Records { file } => {
            let container = load(&file)?;
            let records = mst::records_from_root(&container.blocks, &container.root)?;
            let items: Vec<_> = records
                .iter()
                .map(|(key, cid)| {
                    serde_json::json!({
                        "key": String::from_utf8_lossy(key),
                        "cid": cid,
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": items.len(),
                    "records": items,
                }),
            );
        }

        Commands::Get { file, key } => {
            let container = load(&file)?;
            let records = mst::records_from_root(&container.blocks, &container.root)?;
            let cid = records
                .get(key.as_bytes())
                .ok_or_else(|| anyhow::anyhow!("no record with key {}", key))?;
            let value = container
                .get(cid)
                .ok_or_else(|| anyhow::anyhow!("record block {} is not in the archive", cid))?;
            output(
                &cli.format,
                &serde_json::json!({
                    "key": key,
                    "cid": cid,
                    "value": value.to_json(),
                }),
            );
        }

        #[cfg(feature = "resolve")]
        Commands::Resolve { did, service } => {
            use atcar::{HandleResolver, HttpResolver};
            let resolver = HttpResolver::new(service)?;
            let handle = resolver.resolve_handle(&did)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "did": did,
                    "handle": handle,
                }),
            );
        }

        #[cfg(feature = "resolve")]
        Commands::Url { uri, service } => {
            use atcar::HttpResolver;
            let resolver = HttpResolver::new(service)?;
            let url = atcar::profile_url_from_uri(&uri, &resolver)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "uri": uri,
                    "url": url,
                }),
            );
        }
    }

    Ok(())
}

fn load(path: &PathBuf) -> anyhow::Result<Container> {
    let data = std::fs::read(path)?;
    Ok(Container::parse(&data)?)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value).unwrap());
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).unwrap());
        }
    }
}
