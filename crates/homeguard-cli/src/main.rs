use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homeguard_core::{
    assess, EnrolledIdentity, EuclideanMatcher, RecognitionSettings, DEFAULT_MATCH_THRESHOLD,
};

#[zbus::proxy(
    interface = "org.homeguard.Monitor1",
    default_service = "org.homeguard.Monitor1",
    default_path = "/org/homeguard/Monitor1"
)]
trait Monitor {
    async fn submit_capture(
        &self,
        user: &str,
        request: &str,
        image: Vec<u8>,
    ) -> zbus::Result<String>;
    async fn enroll(
        &self,
        user: &str,
        name: &str,
        descriptor: &str,
        description: &str,
    ) -> zbus::Result<String>;
    async fn list_identities(&self, user: &str) -> zbus::Result<String>;
    async fn remove_identity(&self, user: &str, id: &str) -> zbus::Result<bool>;
    async fn recent_captures(&self, user: &str, limit: u32) -> zbus::Result<String>;
    async fn delete_capture(&self, user: &str, id: &str) -> zbus::Result<bool>;
    async fn capture_stats(&self, user: &str) -> zbus::Result<String>;
    async fn check_new(&self, user: &str, since: &str) -> zbus::Result<String>;
    async fn recent_activity(&self, user: &str, limit: u32) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "homeguard", about = "Homeguard capture monitor CLI")]
struct Cli {
    /// Talk to the daemon on the session bus instead of the system bus
    #[arg(long, global = true)]
    session: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a known face
    Enroll {
        #[arg(short, long)]
        user: String,
        /// Display name for this person
        #[arg(short, long)]
        name: String,
        /// Descriptor as a JSON array, or @path to read it from a file
        #[arg(short, long)]
        descriptor: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Submit a capture and print the verdict
    Capture {
        #[arg(short, long)]
        user: String,
        /// Face descriptor as a JSON array, or @path
        #[arg(short, long)]
        descriptor: Option<String>,
        /// Captured image to pass to the embedding service
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Motion detector confidence (0-100)
        #[arg(long)]
        motion_confidence: Option<u8>,
        #[arg(long)]
        location: Option<String>,
    },
    /// List enrolled faces
    List {
        #[arg(short, long)]
        user: String,
    },
    /// Remove an enrolled face
    Remove {
        #[arg(short, long)]
        user: String,
        /// Identity ID to remove
        id: String,
    },
    /// Show recent captures
    Captures {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Delete a logged capture
    DeleteCapture {
        #[arg(short, long)]
        user: String,
        /// Capture ID to delete
        id: String,
    },
    /// Show capture counts (total, today, last 7 and 30 days)
    Stats {
        #[arg(short, long)]
        user: String,
    },
    /// Check for a capture newer than a timestamp
    CheckNew {
        #[arg(short, long)]
        user: String,
        /// RFC 3339 timestamp, e.g. 2024-06-15T12:00:00Z
        #[arg(long)]
        since: String,
    },
    /// Show the activity log
    Activity {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Show daemon status
    Status,
    /// Match a descriptor against a gallery file without the daemon
    Match {
        /// JSON array of enrolled identities
        #[arg(short, long)]
        gallery: PathBuf,
        /// Query descriptor as a JSON array, or @path (omit for a faceless capture)
        #[arg(short, long)]
        descriptor: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f32,
        /// Alert on recognized faces as well
        #[arg(long)]
        alert_on_recognized: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            gallery,
            descriptor,
            threshold,
            alert_on_recognized,
        } => run_offline_match(&gallery, descriptor.as_deref(), threshold, alert_on_recognized),
        command => run_remote(command, cli.session).await,
    }
}

async fn run_remote(command: Commands, session: bool) -> Result<()> {
    let conn = if session {
        zbus::Connection::session().await
    } else {
        zbus::Connection::system().await
    }
    .context("connecting to D-Bus")?;
    let proxy = MonitorProxy::new(&conn)
        .await
        .context("homeguardd is not reachable")?;

    match command {
        Commands::Enroll {
            user,
            name,
            descriptor,
            description,
        } => {
            let values = read_descriptor(&descriptor)?;
            let id = proxy
                .enroll(&user, &name, &serde_json::to_string(&values)?, &description)
                .await?;
            println!("Enrolled {name} as {id}");
        }
        Commands::Capture {
            user,
            descriptor,
            image,
            motion_confidence,
            location,
        } => {
            let descriptor = descriptor.as_deref().map(read_descriptor).transpose()?;
            let image = match image {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("reading image {}", path.display()))?,
                None => Vec::new(),
            };
            let request = serde_json::json!({
                "descriptor": descriptor,
                "motion_confidence": motion_confidence,
                "location": location,
            });
            let outcome = proxy
                .submit_capture(&user, &request.to_string(), image)
                .await?;
            print_json(&outcome)?;
        }
        Commands::List { user } => print_json(&proxy.list_identities(&user).await?)?,
        Commands::Remove { user, id } => {
            if proxy.remove_identity(&user, &id).await? {
                println!("Removed {id}");
            } else {
                println!("No active face with id {id}");
            }
        }
        Commands::Captures { user, limit } => {
            print_json(&proxy.recent_captures(&user, limit).await?)?
        }
        Commands::DeleteCapture { user, id } => {
            if proxy.delete_capture(&user, &id).await? {
                println!("Deleted capture {id}");
            } else {
                println!("No capture with id {id}");
            }
        }
        Commands::Stats { user } => print_json(&proxy.capture_stats(&user).await?)?,
        Commands::CheckNew { user, since } => print_json(&proxy.check_new(&user, &since).await?)?,
        Commands::Activity { user, limit } => {
            print_json(&proxy.recent_activity(&user, limit).await?)?
        }
        Commands::Status => print_json(&proxy.status().await?)?,
        Commands::Match { .. } => anyhow::bail!("match runs offline and does not use the daemon"),
    }

    Ok(())
}

fn run_offline_match(
    gallery_path: &Path,
    descriptor: Option<&str>,
    threshold: f32,
    alert_on_recognized: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(gallery_path)
        .with_context(|| format!("reading gallery {}", gallery_path.display()))?;
    let gallery: Vec<EnrolledIdentity> =
        serde_json::from_str(&raw).context("gallery must be a JSON array of identities")?;
    let query = descriptor.map(read_descriptor).transpose()?;

    let mut settings = RecognitionSettings {
        match_threshold: threshold,
        ..Default::default()
    };
    settings.policy.alert_on_recognized = alert_on_recognized;

    let assessment = assess(query.as_deref(), &gallery, &settings, &EuclideanMatcher);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

/// Parse a descriptor given inline as JSON or as `@path`.
fn read_descriptor(arg: &str) -> Result<Vec<f32>> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading descriptor file {path}"))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("descriptor must be a JSON array of numbers")
}

/// Pretty-print a JSON string returned by the daemon.
fn print_json(raw: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_descriptor_inline() {
        assert_eq!(read_descriptor("[0.6, 0.8]").unwrap(), vec![0.6, 0.8]);
        assert!(read_descriptor("not json").is_err());
    }

    #[test]
    fn test_cli_parses_match() {
        let cli = Cli::try_parse_from([
            "homeguard", "match", "--gallery", "g.json", "--descriptor", "[1,0]",
        ])
        .unwrap();
        match cli.command {
            Commands::Match { threshold, descriptor, .. } => {
                assert_eq!(threshold, DEFAULT_MATCH_THRESHOLD);
                assert_eq!(descriptor.as_deref(), Some("[1,0]"));
            }
            _ => panic!("expected match subcommand"),
        }
    }

    #[test]
    fn test_cli_parses_check_new() {
        let cli = Cli::try_parse_from([
            "homeguard", "--session", "check-new", "--user", "home", "--since",
            "2024-06-15T12:00:00Z",
        ])
        .unwrap();
        assert!(cli.session);
        match cli.command {
            Commands::CheckNew { user, since } => {
                assert_eq!(user, "home");
                assert_eq!(since, "2024-06-15T12:00:00Z");
            }
            _ => panic!("expected check-new subcommand"),
        }
    }

    #[test]
    fn test_cli_parses_delete_capture_and_activity() {
        let cli = Cli::try_parse_from(["homeguard", "delete-capture", "-u", "home", "c1"]).unwrap();
        assert!(matches!(cli.command, Commands::DeleteCapture { ref id, .. } if id == "c1"));

        let cli = Cli::try_parse_from(["homeguard", "activity", "-u", "home"]).unwrap();
        assert!(matches!(cli.command, Commands::Activity { limit: 20, .. }));
    }
}
