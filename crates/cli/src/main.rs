//! `file-client`: command-line client for the droply file-storage service.
//!
//! Talks to the REST API; the gRPC backend is declared for interface parity
//! but has no implementation, so selecting it fails at configuration time
//! before any request is issued.

use anyhow::{bail, Context};
use api_shared::{ErrorDetail, StatRes};
use clap::{Parser, Subcommand, ValueEnum};
use reqwest::blocking::{multipart, Client, Response};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "file-client")]
#[command(about = "Client for the droply file-storage service")]
struct Cli {
    /// Backend to be used for requests
    #[arg(long, value_enum, default_value = "grpc")]
    backend: Backend,

    /// Host and port of the gRPC server
    #[arg(long, default_value = "localhost:50051")]
    grpc_server: String,

    /// Base URL of the REST server
    #[arg(long, default_value = "http://localhost/")]
    base_url: String,

    /// File to write the output to; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Grpc,
    Rest,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print the new identifier
    Create {
        /// Path of the file to upload
        file: PathBuf,
    },
    /// Print the stored file's metadata in a human-readable manner
    Stat {
        /// Identifier of the stored file
        uuid: String,
    },
    /// Output the stored file's content
    Read {
        /// Identifier of the stored file
        uuid: String,
    },
    /// Delete the stored file
    Delete {
        /// Identifier of the stored file
        uuid: String,
    },
}

/// Cross-cutting request configuration, resolved once from the arguments.
struct ClientConfig {
    base_url: String,
    output: OutputTarget,
}

impl ClientConfig {
    /// Validates the backend capability up front: only the REST transport
    /// exists, so `grpc` is rejected here rather than per request.
    fn new(
        backend: Backend,
        base_url: String,
        grpc_server: &str,
        output: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        match backend {
            Backend::Grpc => {
                bail!(
                    "the grpc backend ({}) is not implemented; rerun with --backend rest",
                    grpc_server
                )
            }
            Backend::Rest => {}
        }

        Ok(Self {
            base_url,
            output: match output {
                Some(path) => OutputTarget::File(path),
                None => OutputTarget::Stdout,
            },
        })
    }

    /// Joins an endpoint path onto the base URL (which carries the
    /// trailing slash, as in the default `http://localhost/`).
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Where command output goes: a file or the standard output stream.
enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        match self {
            Self::File(path) => fs::write(path, text)
                .with_context(|| format!("failed to write output to {}", path.display()))?,
            Self::Stdout => println!("{text}"),
        }
        Ok(())
    }

    fn write_bytes(&self, bytes: &[u8]) -> anyhow::Result<()> {
        match self {
            Self::File(path) => fs::write(path, bytes)
                .with_context(|| format!("failed to write output to {}", path.display()))?,
            Self::Stdout => std::io::stdout().write_all(bytes)?,
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::new(cli.backend, cli.base_url, &cli.grpc_server, cli.output)?;
    let client = Client::new();

    match cli.command {
        Commands::Create { file } => create(&client, &config, &file),
        Commands::Stat { uuid } => stat(&client, &config, &uuid),
        Commands::Read { uuid } => read(&client, &config, &uuid),
        Commands::Delete { uuid } => delete(&client, &config, &uuid),
    }
}

fn create(client: &Client, config: &ClientConfig, file: &Path) -> anyhow::Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .with_context(|| format!("cannot derive a filename from {}", file.display()))?;
    let content =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

    let form = multipart::Form::new().part("file", multipart::Part::bytes(content).file_name(file_name));
    let response = client
        .post(config.url("file/create"))
        .multipart(form)
        .send()?;

    let id: String = check(response)?.json()?;
    config.output.write_text(&id)
}

fn stat(client: &Client, config: &ClientConfig, uuid: &str) -> anyhow::Result<()> {
    let response = client
        .get(config.url(&format!("file/{uuid}/stat")))
        .send()?;

    let stat: StatRes = check(response)?.json()?;
    config.output.write_text(&render_stat(&stat))
}

fn read(client: &Client, config: &ClientConfig, uuid: &str) -> anyhow::Result<()> {
    let response = client
        .get(config.url(&format!("file/{uuid}/read")))
        .send()?;

    let content = check(response)?.bytes()?;
    config.output.write_bytes(&content)
}

fn delete(client: &Client, config: &ClientConfig, uuid: &str) -> anyhow::Result<()> {
    let response = client
        .delete(config.url(&format!("file/{uuid}/delete")))
        .send()?;

    let id: String = check(response)?.json()?;
    config.output.write_text(&id)
}

/// Passes successful responses through; turns failures into an error
/// carrying the server's detail message.
fn check(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorDetail>()
        .map(|d| d.detail)
        .unwrap_or_else(|_| "no error detail".into());
    bail!("server answered {}: {}", status, detail)
}

fn render_stat(stat: &StatRes) -> String {
    format!(
        "Creation datetime: {}\nsize: {}\nmimetype: {}\nname: {}",
        stat.create_datetime, stat.size, stat.mimetype, stat.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_grpc_backend_fails_at_configuration_time() {
        let result = ClientConfig::new(
            Backend::Grpc,
            "http://localhost/".into(),
            "localhost:50051",
            None,
        );

        let err = result.err().unwrap().to_string();
        assert!(err.contains("not implemented"), "got: {err}");
    }

    #[test]
    fn test_rest_backend_is_accepted() {
        let config = ClientConfig::new(
            Backend::Rest,
            "http://localhost:8080/".into(),
            "localhost:50051",
            None,
        )
        .unwrap();

        assert_eq!(
            config.url("file/1234/stat"),
            "http://localhost:8080/file/1234/stat"
        );
    }

    #[test]
    fn test_render_stat() {
        let rendered = render_stat(&StatRes {
            create_datetime: "2024-01-01T00:00:00.000000Z".into(),
            size: 4,
            mimetype: "text/plain".into(),
            name: "1234.txt".into(),
        });

        assert!(rendered.contains("Creation datetime: 2024-01-01T00:00:00.000000Z"));
        assert!(rendered.contains("size: 4"));
        assert!(rendered.contains("mimetype: text/plain"));
        assert!(rendered.contains("name: 1234.txt"));
    }

    #[test]
    fn test_output_target_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.txt");

        let target = OutputTarget::File(path.clone());
        target.write_text("abcd1234").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcd1234");

        target.write_bytes(b"\x00\x01").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"\x00\x01");
    }
}
