//! Registry administration CLI.
//!
//! File-based account management against the same registry JSON the server
//! serves from; every command goes through the store's atomic load/save.
//!
//! # Usage
//!
//! ```bash
//! # Add a user with a 10 GB quota expiring in 30 days
//! warden user add -r users.json -u alice -p secret -q 10GB -e 30
//!
//! # Bulk-create trial accounts trial1..trial20
//! warden user bulk-add -r users.json --prefix trial -c 20 -q 5GB -e 7
//!
//! # List, block, reset
//! warden user list -r users.json
//! warden user block -r users.json -u alice
//! warden user reset-usage -r users.json -u all
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distr::Alphanumeric;
use tabled::{Table, Tabled};
use time::OffsetDateTime;

use crate::account::{Account, format_date};
use crate::store::{CorruptPolicy, RegistryStore};

/// Registry administration CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "warden-user", version, about = "Manage warden registry accounts")]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

/// Shared `--registry` option.
#[derive(Parser, Debug, Clone)]
pub struct RegistryOpt {
    /// Registry file path.
    #[arg(short, long, env = "WARDEN_REGISTRY", default_value = "users.json")]
    pub registry: PathBuf,
}

/// Admin subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// Add a single account.
    Add {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username (letters, digits, underscores).
        #[arg(short, long)]
        username: String,

        /// Password. Generated when omitted.
        #[arg(short, long)]
        password: Option<String>,

        /// Byte quota (e.g. "10GB", "500MB", "0" for unlimited).
        #[arg(short, long, default_value = "0")]
        quota: String,

        /// Days until expiration (0 = never).
        #[arg(short, long, default_value_t = 0)]
        expiration_days: i64,

        /// Exempt from the concurrent-IP policy.
        #[arg(long)]
        unlimited: bool,
    },

    /// Add a numbered batch of accounts with generated passwords.
    BulkAdd {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username prefix; accounts are named `<prefix><n>`.
        #[arg(long)]
        prefix: String,

        /// How many accounts to create.
        #[arg(short, long)]
        count: u32,

        /// Starting number for the suffix.
        #[arg(short, long, default_value_t = 1)]
        start_number: u32,

        /// Byte quota per account (e.g. "10GB", "0" for unlimited).
        #[arg(short, long, default_value = "0")]
        quota: String,

        /// Days until expiration (0 = never).
        #[arg(short, long, default_value_t = 0)]
        expiration_days: i64,

        /// Exempt from the concurrent-IP policy.
        #[arg(long)]
        unlimited: bool,
    },

    /// Remove an account.
    Remove {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username to remove.
        #[arg(short, long)]
        username: String,
    },

    /// List accounts.
    List {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Output format (table, json, csv).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Block an account.
    Block {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username to block.
        #[arg(short, long)]
        username: String,
    },

    /// Unblock an account.
    Unblock {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username to unblock.
        #[arg(short, long)]
        username: String,
    },

    /// Update quota or expiration for an account.
    Set {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username to update.
        #[arg(short, long)]
        username: String,

        /// New byte quota (e.g. "10GB").
        #[arg(short, long)]
        quota: Option<String>,

        /// New expiration in days from the creation date.
        #[arg(short, long)]
        expiration_days: Option<i64>,
    },

    /// Reset usage counters for one account, or "all".
    ResetUsage {
        #[command(flatten)]
        registry: RegistryOpt,

        /// Username to reset (or "all").
        #[arg(short, long)]
        username: String,
    },
}

/// Account row for display.
#[derive(Tabled)]
struct AccountDisplay {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Quota")]
    quota: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Blocked")]
    blocked: String,
    #[tabled(rename = "Unlimited IPs")]
    unlimited: String,
}

/// Run the admin CLI with the given arguments.
pub fn run(args: UserArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        UserCommands::Add {
            registry,
            username,
            password,
            quota,
            expiration_days,
            unlimited,
        } => add_accounts(
            &registry,
            std::iter::once(username),
            password,
            &quota,
            expiration_days,
            unlimited,
        ),
        UserCommands::BulkAdd {
            registry,
            prefix,
            count,
            start_number,
            quota,
            expiration_days,
            unlimited,
        } => {
            let names = (0..count).map(move |i| format!("{prefix}{}", start_number + i));
            add_accounts(&registry, names, None, &quota, expiration_days, unlimited)
        }
        UserCommands::Remove { registry, username } => remove_account(&registry, &username),
        UserCommands::List { registry, format } => list_accounts(&registry, &format),
        UserCommands::Block { registry, username } => set_blocked(&registry, &username, true),
        UserCommands::Unblock { registry, username } => set_blocked(&registry, &username, false),
        UserCommands::Set {
            registry,
            username,
            quota,
            expiration_days,
        } => set_limits(&registry, &username, quota.as_deref(), expiration_days),
        UserCommands::ResetUsage { registry, username } => reset_usage(&registry, &username),
    }
}

/// The CLI refuses to touch a corrupt file rather than rewriting it empty.
fn open_store(opt: &RegistryOpt) -> RegistryStore {
    RegistryStore::new(&opt.registry, Duration::from_secs(10), CorruptPolicy::Fail)
}

fn load(opt: &RegistryOpt) -> Result<HashMap<String, Account>, Box<dyn std::error::Error>> {
    Ok(open_store(opt).load_blocking()?.accounts)
}

fn save(
    opt: &RegistryOpt,
    accounts: &HashMap<String, Account>,
) -> Result<(), Box<dyn std::error::Error>> {
    open_store(opt).save_blocking(accounts)?;
    Ok(())
}

fn add_accounts(
    registry: &RegistryOpt,
    usernames: impl Iterator<Item = String>,
    password: Option<String>,
    quota: &str,
    expiration_days: i64,
    unlimited: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let quota_bytes = parse_size(quota)?;
    let mut accounts = load(registry)?;
    let creation_date = format_date(OffsetDateTime::now_utc().date());

    let mut existing_lower: std::collections::HashSet<String> =
        accounts.keys().map(|u| u.to_lowercase()).collect();

    let mut added = 0u32;
    for username in usernames {
        if !valid_username(&username) {
            eprintln!(
                "Skipping '{username}': usernames may only contain letters, digits, and underscores."
            );
            continue;
        }
        // Lookups stay case-sensitive, but creating case-colliding names
        // would leave two confusable accounts; refuse.
        if !existing_lower.insert(username.to_lowercase()) {
            eprintln!("Skipping '{username}': a user with that name already exists.");
            continue;
        }

        let password = password.clone().unwrap_or_else(generate_password);
        let mut account = Account::with_password(&password);
        account.max_download_bytes = quota_bytes;
        account.expiration_days = expiration_days;
        account.account_creation_date = Some(creation_date.clone());
        account.unlimited_user = unlimited;

        println!("{username}:{password}");
        accounts.insert(username, account);
        added += 1;
    }

    if added == 0 {
        println!("No new users to add.");
        return Ok(());
    }

    save(registry, &accounts)?;
    println!("Added {added} user(s).");
    Ok(())
}

fn remove_account(
    registry: &RegistryOpt,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut accounts = load(registry)?;
    if accounts.remove(username).is_none() {
        println!("No user named '{username}'.");
        return Ok(());
    }
    save(registry, &accounts)?;
    println!("User '{username}' removed.");
    Ok(())
}

fn list_accounts(registry: &RegistryOpt, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let accounts = load(registry)?;
    if accounts.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut usernames: Vec<&String> = accounts.keys().collect();
    usernames.sort();

    match format {
        "json" => {
            let rows: Vec<serde_json::Value> = usernames
                .iter()
                .map(|username| {
                    let a = &accounts[username.as_str()];
                    serde_json::json!({
                        "username": username,
                        "max_download_bytes": a.max_download_bytes,
                        "used_bytes": a.total_bytes(),
                        "expires": a.expires_on().map(format_date),
                        "blocked": a.blocked,
                        "unlimited_user": a.unlimited_user,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "csv" => {
            println!("username,quota,used,expires,blocked,unlimited_user");
            for username in usernames {
                let a = &accounts[username.as_str()];
                println!(
                    "{},{},{},{},{},{}",
                    username,
                    a.max_download_bytes,
                    a.total_bytes(),
                    a.expires_on().map(format_date).unwrap_or_default(),
                    a.blocked,
                    a.unlimited_user,
                );
            }
        }
        _ => {
            let rows: Vec<AccountDisplay> = usernames
                .iter()
                .map(|username| {
                    let a = &accounts[username.as_str()];
                    AccountDisplay {
                        username: (*username).clone(),
                        quota: format_quota(a.max_download_bytes),
                        used: format_bytes(a.total_bytes()),
                        expires: a
                            .expires_on()
                            .map(format_date)
                            .unwrap_or_else(|| "Never".to_string()),
                        blocked: if a.blocked { "Yes" } else { "No" }.to_string(),
                        unlimited: if a.unlimited_user { "Yes" } else { "No" }.to_string(),
                    }
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}

fn set_blocked(
    registry: &RegistryOpt,
    username: &str,
    blocked: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut accounts = load(registry)?;
    let Some(account) = accounts.get_mut(username) else {
        println!("No user named '{username}'.");
        return Ok(());
    };
    account.blocked = blocked;
    save(registry, &accounts)?;
    println!(
        "User '{username}' {}.",
        if blocked { "blocked" } else { "unblocked" }
    );
    Ok(())
}

fn set_limits(
    registry: &RegistryOpt,
    username: &str,
    quota: Option<&str>,
    expiration_days: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if quota.is_none() && expiration_days.is_none() {
        println!("No updates specified.");
        return Ok(());
    }
    let mut accounts = load(registry)?;
    let Some(account) = accounts.get_mut(username) else {
        println!("No user named '{username}'.");
        return Ok(());
    };
    if let Some(q) = quota {
        account.max_download_bytes = parse_size(q)?;
    }
    if let Some(days) = expiration_days {
        account.expiration_days = days;
    }
    save(registry, &accounts)?;
    println!("User '{username}' updated.");
    Ok(())
}

fn reset_usage(registry: &RegistryOpt, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut accounts = load(registry)?;
    let affected = if username == "all" {
        for account in accounts.values_mut() {
            account.upload_bytes = 0;
            account.download_bytes = 0;
        }
        accounts.len()
    } else {
        match accounts.get_mut(username) {
            Some(account) => {
                account.upload_bytes = 0;
                account.download_bytes = 0;
                1
            }
            None => {
                println!("No user named '{username}'.");
                return Ok(());
            }
        }
    };
    save(registry, &accounts)?;
    println!("Usage reset for {affected} user(s).");
    Ok(())
}

fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Parse a size string ("10GB", "500MB", "1024", "0") to bytes.
fn parse_size(s: &str) -> Result<i64, Box<dyn std::error::Error>> {
    let s = s.trim().to_uppercase();
    if s.is_empty() || s == "0" {
        return Ok(0);
    }

    let (num, unit) = if let Some(n) = s.strip_suffix("TB") {
        (n, 1024i64 * 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1024i64 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024i64 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024i64)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1i64)
    } else {
        (s.as_str(), 1i64)
    };

    let value: f64 = num.trim().parse()?;
    if value < 0.0 {
        return Err(format!("size must be non-negative: {s}").into());
    }
    Ok((value * unit as f64) as i64)
}

fn format_bytes(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;
    const TB: i64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

fn format_quota(bytes: i64) -> String {
    if bytes <= 0 {
        "Unlimited".to_string()
    } else {
        format_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_units() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("10GB").unwrap(), 10 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5MB").unwrap(), 1_572_864);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert!(parse_size("ten").is_err());
        assert!(parse_size("-1GB").is_err());
    }

    #[test]
    fn username_charset() {
        assert!(valid_username("alice_01"));
        assert!(!valid_username(""));
        assert!(!valid_username("alice-01"));
        assert!(!valid_username("alice 01"));
    }

    #[test]
    fn generated_passwords_are_long_and_distinct() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn format_bytes_rounds() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_quota(0), "Unlimited");
    }

    #[test]
    fn add_then_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let opt = RegistryOpt {
            registry: dir.path().join("users.json"),
        };

        add_accounts(
            &opt,
            std::iter::once("alice".to_string()),
            Some("p1".to_string()),
            "1GB",
            30,
            false,
        )
        .unwrap();

        let accounts = load(&opt).unwrap();
        let alice = &accounts["alice"];
        assert_eq!(alice.password, "p1");
        assert_eq!(alice.max_download_bytes, 1024 * 1024 * 1024);
        assert_eq!(alice.expiration_days, 30);
        assert!(alice.account_creation_date.is_some());
    }

    #[test]
    fn add_refuses_case_colliding_username() {
        let dir = tempfile::tempdir().unwrap();
        let opt = RegistryOpt {
            registry: dir.path().join("users.json"),
        };

        add_accounts(
            &opt,
            std::iter::once("Alice".to_string()),
            Some("p1".to_string()),
            "0",
            0,
            false,
        )
        .unwrap();
        add_accounts(
            &opt,
            std::iter::once("alice".to_string()),
            Some("p2".to_string()),
            "0",
            0,
            false,
        )
        .unwrap();

        let accounts = load(&opt).unwrap();
        assert_eq!(accounts.len(), 1);
        assert!(accounts.contains_key("Alice"));
    }

    #[test]
    fn bulk_add_names_accounts_sequentially() {
        let dir = tempfile::tempdir().unwrap();
        let opt = RegistryOpt {
            registry: dir.path().join("users.json"),
        };

        let names = (0..3).map(|i| format!("trial{}", 5 + i));
        add_accounts(&opt, names, None, "5GB", 7, true).unwrap();

        let accounts = load(&opt).unwrap();
        assert_eq!(accounts.len(), 3);
        for name in ["trial5", "trial6", "trial7"] {
            let account = &accounts[name];
            assert_eq!(account.password.len(), 32);
            assert!(account.unlimited_user);
            assert_eq!(account.expiration_days, 7);
        }
    }
}
