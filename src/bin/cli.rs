//! AnsuryX CLI
//!
//! Command-line client for the AnsuryX API:
//! - Sign up, sign in and out
//! - Start, reset and check the challenge
//! - Toggle daily habits
//! - Write and export the journal
//! - Check achievements and download the certificate

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ansuryx-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "40-day habit challenge tracker")]
#[command(long_about = "AnsuryX tracks five daily habits over a 40-day challenge.\nComplete every habit each day to build your streak.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8040", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Signup {
        email: String,
        #[arg(short, long)]
        password: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Sign in and remember the session
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Request a password reset
    ResetPassword { email: String },

    /// Show server health and today's dashboard
    Status,

    /// Start a new challenge today
    Start,

    /// Abandon the current challenge and start over
    Reset,

    /// Toggle a habit for today (prayer, quran, exercise, water, journal)
    Toggle { habit: String },

    /// List the daily habits
    Habits,

    /// Print the challenge rules
    Rules,

    /// Show or update your profile
    Profile {
        /// New display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Journal commands
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Show unlocked milestones
    Achievements,

    /// Check certificate eligibility, downloading it once earned
    Certificate {
        /// Where to save the certificate
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum JournalAction {
    /// Save today's entry
    Write { content: String },
    /// List entries, newest first
    List,
    /// Download all entries
    Export {
        /// text, csv or json
        #[arg(short = 't', long = "type", default_value = "text")]
        kind: String,
        /// Output file (default: server-suggested name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Session remembered between invocations
#[derive(Debug, Serialize, Deserialize)]
struct SavedSession {
    api_url: String,
    email: String,
    token: String,
}

fn session_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir().context("no config directory on this platform")?;
    Ok(dir.join("ansuryx").join("session.json"))
}

fn load_session() -> anyhow::Result<SavedSession> {
    let path = session_path()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|_| anyhow::anyhow!("Not signed in. Run: ansuryx-cli login <email> -p <password>"))?;
    serde_json::from_str(&content).with_context(|| format!("reading {:?}", path))
}

fn save_session(session: &SavedSession) -> anyhow::Result<()> {
    let path = session_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

/// HTTP client bound to one server and optional session
struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    fn authenticated(api_url: &str) -> anyhow::Result<Self> {
        let session = load_session()?;
        if session.api_url.trim_end_matches('/') != api_url.trim_end_matches('/') {
            eprintln!(
                "Warning: signed in as {} against {}, not {}",
                session.email, session.api_url, api_url
            );
        }
        let mut client = Self::new(api_url);
        client.token = Some(session.token);
        Ok(client)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        json_or_error(self.request(reqwest::Method::GET, path).send().await?).await
    }

    async fn post(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        json_or_error(self.request(reqwest::Method::POST, path).json(&body).send().await?).await
    }

    async fn put(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        json_or_error(self.request(reqwest::Method::PUT, path).json(&body).send().await?).await
    }

    /// GET a download, returning the suggested filename and body
    async fn download(&self, path: &str) -> anyhow::Result<(Option<String>, String)> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);
        Ok((filename, response.text().await?))
    }
}

/// Bare file name from a `Content-Disposition` value, without any directories
fn attachment_filename(disposition: &str) -> Option<String> {
    let quoted = disposition.split("filename=\"").nth(1)?;
    let name = quoted.trim_end_matches('"');
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

async fn json_or_error(response: reqwest::Response) -> anyhow::Result<Value> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from(response).await)
    }
}

async fn error_from(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or(text);
    anyhow::anyhow!("{} ({})", message, status)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let client = ApiClient::new(&cli.api_url);
            let body = serde_json::json!({
                "email": email,
                "password": password,
                "full_name": name,
            });
            client.post("/api/v1/auth/signup", body).await?;
            println!("Account created for {}", email);
            println!("Sign in with: ansuryx-cli login {} -p <password>", email);
        }

        Commands::Login { email, password } => {
            let client = ApiClient::new(&cli.api_url);
            let body = serde_json::json!({ "email": email, "password": password });
            let signed_in = client.post("/api/v1/auth/login", body).await?;

            let token = signed_in["token"]
                .as_str()
                .context("server response had no token")?
                .to_string();
            save_session(&SavedSession {
                api_url: cli.api_url.clone(),
                email: email.clone(),
                token,
            })?;
            println!("Signed in as {}", email);
        }

        Commands::Logout => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            if let Err(e) = client.post("/api/v1/auth/logout", Value::Null).await {
                eprintln!("Server sign-out failed: {:#}", e);
            }
            let path = session_path()?;
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            println!("Signed out");
        }

        Commands::ResetPassword { email } => {
            let client = ApiClient::new(&cli.api_url);
            let result = client
                .post(
                    "/api/v1/auth/reset-password",
                    serde_json::json!({ "email": email }),
                )
                .await?;
            println!("{}", result["message"].as_str().unwrap_or("Request accepted"));
        }

        Commands::Status => {
            let client = ApiClient::new(&cli.api_url);
            let health = match client.get("/health").await {
                Ok(health) => health,
                Err(e) => {
                    eprintln!("Cannot connect to AnsuryX API at {}", cli.api_url);
                    eprintln!("Error: {:#}", e);
                    eprintln!();
                    eprintln!("Make sure the AnsuryX server is running:");
                    eprintln!("  cargo run --bin ansuryx");
                    std::process::exit(1);
                }
            };

            println!("AnsuryX v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "API Status: {} ({} store, up {})",
                health["status"].as_str().unwrap_or("unknown"),
                health["backend"].as_str().unwrap_or("unknown"),
                format_duration(health["uptime_seconds"].as_u64().unwrap_or(0))
            );

            match ApiClient::authenticated(&cli.api_url) {
                Ok(client) => {
                    let dashboard = client.get("/api/v1/challenge").await?;
                    println!();
                    if json_output {
                        println!("{}", serde_json::to_string_pretty(&dashboard)?);
                    } else {
                        print_dashboard(&dashboard);
                    }
                }
                Err(_) => {
                    println!();
                    println!("Not signed in.");
                }
            }
        }

        Commands::Start => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            let challenge = client.post("/api/v1/challenge", Value::Null).await?;
            println!(
                "Challenge started on {}. Day 1 of 40.",
                challenge["start_date"].as_str().unwrap_or("today")
            );
        }

        Commands::Reset => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            client.post("/api/v1/challenge/reset", Value::Null).await?;
            println!("Challenge reset. A new 40 days begins today.");
        }

        Commands::Toggle { habit } => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            let outcome = client
                .post(&format!("/api/v1/progress/{}/toggle", habit), Value::Null)
                .await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let done = outcome["completed"].as_bool().unwrap_or(false);
                println!(
                    "{} {} ({:.0}% of today done)",
                    if done { "Completed" } else { "Unchecked" },
                    habit,
                    outcome["completion_rate"].as_f64().unwrap_or(0.0)
                );
                if outcome["challenge_completed"].as_bool().unwrap_or(false) {
                    println!("Challenge complete! Download your certificate with: ansuryx-cli certificate");
                } else if outcome["day_completed"].as_bool().unwrap_or(false) {
                    println!(
                        "All habits done. Day {} recorded.",
                        outcome["challenge"]["current_day"].as_u64().unwrap_or(0)
                    );
                }
            }
        }

        Commands::Habits => {
            let client = ApiClient::new(&cli.api_url);
            let catalogue = client.get("/api/v1/habits").await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&catalogue)?);
            } else {
                println!("{:<10} {:<4} {:<22} {}", "ID", "", "Habit", "Category");
                println!("{}", "-".repeat(50));
                for habit in catalogue["habits"].as_array().into_iter().flatten() {
                    println!(
                        "{:<10} {:<4} {:<22} {}",
                        habit["id"].as_str().unwrap_or("-"),
                        habit["icon"].as_str().unwrap_or(""),
                        habit["title"].as_str().unwrap_or("-"),
                        habit["category"].as_str().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Rules => {
            let client = ApiClient::new(&cli.api_url);
            let rules = client.get("/api/v1/rules").await?;
            println!("{}", rules["rules"].as_str().unwrap_or(""));
        }

        Commands::Profile { name } => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            let profile = match name {
                Some(name) => {
                    client
                        .put("/api/v1/profile", serde_json::json!({ "full_name": name }))
                        .await?
                }
                None => client.get("/api/v1/profile").await?,
            };

            if json_output {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("{}", profile["display_name"].as_str().unwrap_or("-"));
                println!("{}", profile["user"]["email"].as_str().unwrap_or("-"));
                println!();
                println!(
                    "Longest streak:       {}",
                    profile["stats"]["longest_streak"].as_u64().unwrap_or(0)
                );
                println!(
                    "Challenges completed: {}",
                    profile["stats"]["challenges_completed"].as_u64().unwrap_or(0)
                );
                println!(
                    "Total days:           {}",
                    profile["stats"]["total_days"].as_u64().unwrap_or(0)
                );
            }
        }

        Commands::Journal { action } => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            match action {
                JournalAction::Write { content } => {
                    let entry = client
                        .put(
                            "/api/v1/journal/today",
                            serde_json::json!({ "content": content }),
                        )
                        .await?;
                    println!(
                        "Saved journal entry for {}",
                        entry["date"].as_str().unwrap_or("today")
                    );
                }
                JournalAction::List => {
                    let listing = client.get("/api/v1/journal").await?;
                    if json_output {
                        println!("{}", serde_json::to_string_pretty(&listing)?);
                    } else {
                        let entries = listing["entries"].as_array().cloned().unwrap_or_default();
                        if entries.is_empty() {
                            println!("No journal entries yet.");
                            println!();
                            println!("Write your first reflection with:");
                            println!("  ansuryx-cli journal write \"...\"");
                        }
                        for entry in entries {
                            println!("{}", entry["date"].as_str().unwrap_or("-"));
                            println!("{}", entry["content"].as_str().unwrap_or(""));
                            println!("{}", "-".repeat(40));
                        }
                    }
                }
                JournalAction::Export { kind, output } => {
                    let (filename, body) = client
                        .download(&format!("/api/v1/journal/export?format={}", kind))
                        .await?;
                    let path = output
                        .or_else(|| filename.map(PathBuf::from))
                        .unwrap_or_else(|| PathBuf::from("AnsuryX-Challenge-Journal.txt"));
                    std::fs::write(&path, body)?;
                    println!("Exported to {:?}", path);
                }
            }
        }

        Commands::Achievements => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            let summary = client.get("/api/v1/achievements").await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Current streak: {} days ({}/{} unlocked)",
                    summary["current_streak"].as_u64().unwrap_or(0),
                    summary["unlocked_count"].as_u64().unwrap_or(0),
                    summary["total"].as_u64().unwrap_or(0)
                );
                println!();
                for achievement in summary["achievements"].as_array().into_iter().flatten() {
                    let unlocked = achievement["unlocked"].as_bool().unwrap_or(false);
                    println!(
                        "{} {:<3} {:<20} {}",
                        if unlocked { "[x]" } else { "[ ]" },
                        achievement["days"].as_u64().unwrap_or(0),
                        achievement["title"].as_str().unwrap_or("-"),
                        achievement["description"].as_str().unwrap_or("")
                    );
                }
                if let Some(days) = summary["days_to_next"].as_u64() {
                    println!();
                    println!(
                        "Next: {} in {} days",
                        summary["next"]["title"].as_str().unwrap_or("-"),
                        days
                    );
                }
            }
        }

        Commands::Certificate { output } => {
            let client = ApiClient::authenticated(&cli.api_url)?;
            let status = client.get("/api/v1/certificate").await?;

            if !status["eligible"].as_bool().unwrap_or(false) {
                println!(
                    "Keep going! {} days remaining to earn your certificate (streak: {}).",
                    status["days_remaining"].as_u64().unwrap_or(40),
                    status["current_streak"].as_u64().unwrap_or(0)
                );
                return Ok(());
            }

            let (filename, html) = client.download("/api/v1/certificate/download").await?;
            let path = output
                .or_else(|| filename.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("AnsuryX-Challenge-Certificate.html"));
            std::fs::write(&path, html)?;
            println!("Certificate saved to {:?}", path);
        }

        Commands::Config { output } => {
            let config = ansuryx::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_dashboard(dashboard: &Value) {
    println!("{}", dashboard["day_label"].as_str().unwrap_or("-"));

    if dashboard["challenge"].is_null() {
        println!("Start your challenge with: ansuryx-cli start");
        return;
    }

    if dashboard["streak_broken"].as_bool().unwrap_or(false) {
        println!("Your streak was broken. Reset to begin again: ansuryx-cli reset");
    }
    println!(
        "Streak: {} days, {} remaining",
        dashboard["streak"].as_u64().unwrap_or(0),
        dashboard["days_remaining"].as_u64().unwrap_or(0)
    );
    println!(
        "Today: {:.0}% complete",
        dashboard["completion_rate"].as_f64().unwrap_or(0.0)
    );

    if let Some(progress) = dashboard["progress"].as_object() {
        for (habit, done) in progress {
            println!(
                "  {} {}",
                if done.as_bool().unwrap_or(false) { "[x]" } else { "[ ]" },
                habit
            );
        }
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("attachment; filename=\"AnsuryX-Challenge-Journal-Amina.csv\"")
                .as_deref(),
            Some("AnsuryX-Challenge-Journal-Amina.csv")
        );
        assert!(attachment_filename("attachment").is_none());
    }

    #[test]
    fn test_attachment_filename_drops_directories() {
        assert_eq!(
            attachment_filename("attachment; filename=\"../../.bashrc\"").as_deref(),
            Some(".bashrc")
        );
        assert_eq!(
            attachment_filename("attachment; filename=\"/etc/cron.d/job\"").as_deref(),
            Some("job")
        );
        assert!(attachment_filename("attachment; filename=\"..\"").is_none());
        assert!(attachment_filename("attachment; filename=\"/\"").is_none());
    }
}
