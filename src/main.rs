//! Pro Lot Calculator
//!
//! Sizes crypto positions from account balance, risk budget, and stop-loss
//! distance, then checks the size against the instrument's lot constraints.

mod api;
mod db;
mod models;
mod sync;
mod trading;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{AssistantClient, AssistantConfig, GREETING};
use crate::db::Database;
use crate::models::{AuthEvent, Session};
use crate::sync::SettingsSync;
use crate::trading::{catalog, CalculatorConfig, RiskParameters};

/// Position size calculator CLI.
#[derive(Parser)]
#[command(name = "lotcalc")]
#[command(about = "Risk-based lot size calculator for crypto instruments", long_about = None)]
struct Cli {
    /// Settings database URL
    #[arg(short, long, env = "LOTCALC_DATABASE", default_value = "sqlite:./lotcalc.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOTCALC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tradable instruments and their lot constraints
    Instruments,

    /// Calculate a position size
    Calc {
        /// Account balance in USD
        #[arg(short, long, allow_hyphen_values = true)]
        balance: Option<String>,

        /// Percent of balance to risk
        #[arg(short = 'p', long, allow_hyphen_values = true, conflicts_with = "risk_cash")]
        risk_percent: Option<String>,

        /// Dollar amount to risk
        #[arg(short = 'c', long, allow_hyphen_values = true)]
        risk_cash: Option<String>,

        /// Stop-loss distance in USD
        #[arg(short, long, allow_hyphen_values = true)]
        sl: Option<String>,

        /// Instrument symbol or base asset (e.g. AVAX/USD or avax)
        #[arg(short = 'i', long)]
        symbol: Option<String>,
    },

    /// Interactive session with settings saved for a user
    Session {
        /// User identifier the settings are stored under
        #[arg(short, long)]
        user_id: String,

        /// Account email
        #[arg(short, long, default_value = "")]
        email: String,

        /// Quiet period before edits are saved (milliseconds)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },

    /// Ask the risk assistant a question
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    catalog::validate(catalog::all()).context("Instrument catalog is inconsistent")?;

    let config = CalculatorConfig::default();

    match cli.command {
        Commands::Instruments => {
            println!(
                "\n{:<10} {:<12} {:<7} {:>9} {:>9} {:>9} {:>9} {:>7} {:>6}",
                "SYMBOL", "NAME", "TYPE", "CONTRACT", "MIN", "MAX", "STEP", "MARGIN", "PX DP"
            );
            println!("{}", "-".repeat(86));

            for i in catalog::all() {
                println!(
                    "{:<10} {:<12} {:<7} {:>9} {:>9} {:>9} {:>9} {:>7} {:>6}",
                    i.symbol,
                    truncate(i.name, 12),
                    i.asset_type,
                    i.lot_size,
                    i.min_size,
                    i.max_size,
                    i.step_size,
                    i.margin_rate,
                    i.precision
                );
            }
        }

        Commands::Calc {
            balance,
            risk_percent,
            risk_cash,
            sl,
            symbol,
        } => {
            let mut params = RiskParameters::from_config(&config);

            if let Some(symbol) = symbol {
                let instrument = catalog::resolve(&symbol)
                    .ok_or_else(|| anyhow::anyhow!("Unknown instrument: {}", symbol))?;
                params.set_instrument(instrument);
            }
            if let Some(v) = balance {
                params.set_balance(v);
            }
            if let Some(v) = risk_percent {
                params.set_risk_percent(v);
            }
            if let Some(v) = risk_cash {
                params.set_risk_cash(v);
            }
            if let Some(v) = sl {
                params.set_sl_distance(v);
            }

            print_params(&params);
            print_result(&params);
        }

        Commands::Session {
            user_id,
            email,
            debounce_ms,
        } => {
            let debounce = debounce_ms
                .map(std::time::Duration::from_millis)
                .unwrap_or_else(|| config.save_debounce());

            let db = Arc::new(Database::new(&cli.database).await?);
            let mut sync = SettingsSync::new(db, debounce);
            let mut params = RiskParameters::from_config(&config);

            sign_in(&mut sync, &mut params, Session::new(user_id, email)).await;

            println!("\n=== Lot Calculator Session ===");
            println!("Type 'help' for commands.\n");
            print_params(&params);
            print_result(&params);

            run_session(&mut sync, &mut params).await?;

            sync.flush().await;
            println!("Save status: {}", sync.status().await.as_str());
        }

        Commands::Ask { question } => {
            let client = AssistantClient::new(AssistantConfig::from_env())?;
            if !client.is_configured() {
                println!("GEMINI_API_KEY is not set; the assistant is unavailable.");
                return Ok(());
            }

            let question = question.join(" ");
            info!(question = %question, "Asking assistant");

            println!("\n{}\n", GREETING);
            println!("> {}\n", question);
            if let Some(reply) = client.ask(&question).await {
                println!("{}", reply);
            }
        }

        Commands::Config => {
            let assistant = AssistantConfig::from_env();

            println!("\n=== Calculator Configuration ===\n");
            println!("Defaults:");
            println!("  Instrument:           {}", config.default_symbol);
            println!("  Balance:              ${}", config.default_balance);
            println!("  Risk Percent:         {}%", config.default_risk_percent);
            println!("  Risk Cash:            ${}", config.default_risk_cash);
            println!("  Stop Loss Distance:   ${}", config.default_sl_distance);

            println!("\nSettings Store:");
            println!("  Database:             {}", cli.database);
            println!("  Save Debounce:        {}ms", config.save_debounce_ms);

            println!("\nAssistant:");
            println!("  Model:                {}", assistant.model);
            println!("  Endpoint:             {}", assistant.base_url);
            println!(
                "  API Key:              {}",
                if assistant.api_key.is_some() { "set" } else { "not set" }
            );

            println!("\nInstruments:          {}", catalog::all().len());
        }
    }

    Ok(())
}

/// Start a session and import its stored settings, if any.
async fn sign_in(sync: &mut SettingsSync, params: &mut RiskParameters, session: Session) {
    match sync.on_auth_event(AuthEvent::SignedIn(session)).await {
        Ok(Some(snapshot)) => {
            params.apply_snapshot(snapshot);
            println!("Restored saved settings.");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Could not load saved settings, using defaults"),
    }
}

/// Read edit commands from stdin until quit, EOF or Ctrl+C.
async fn run_session(sync: &mut SettingsSync, params: &mut RiskParameters) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let line = line.trim();
        let (command, value) = line
            .split_once(char::is_whitespace)
            .map(|(c, v)| (c, v.trim()))
            .unwrap_or((line, ""));

        match command.to_lowercase().as_str() {
            "" => continue,
            "balance" | "b" => params.set_balance(value),
            "percent" | "p" => params.set_risk_percent(value),
            "cash" | "c" => params.set_risk_cash(value),
            "sl" | "s" => params.set_sl_distance(value),
            "symbol" | "i" => match catalog::resolve(value) {
                Some(instrument) => params.set_instrument(instrument),
                None => {
                    println!("Unknown instrument: {}", value);
                    continue;
                }
            },
            "show" => {
                print_params(params);
                print_result(params);
                continue;
            }
            "status" => {
                let user = sync
                    .session()
                    .map(|s| s.user_id.clone())
                    .unwrap_or_else(|| "signed out".to_string());
                println!(
                    "User: {} | Save status: {} | Saves: {}",
                    user,
                    sync.status().await.as_str(),
                    sync.saves_completed()
                );
                continue;
            }
            "login" => {
                let (user_id, email) = value
                    .split_once(char::is_whitespace)
                    .map(|(u, e)| (u, e.trim()))
                    .unwrap_or((value, ""));
                if user_id.is_empty() {
                    println!("Usage: login <user-id> [email]");
                } else {
                    sign_in(sync, params, Session::new(user_id, email)).await;
                    print_params(params);
                    print_result(params);
                }
                continue;
            }
            "logout" => {
                sync.on_auth_event(AuthEvent::SignedOut).await?;
                println!("Signed out. Edits will not be saved.");
                continue;
            }
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                print_help();
                continue;
            }
            other => {
                println!("Unknown command: {} (type 'help')", other);
                continue;
            }
        }

        print_result(params);
        sync.schedule(params.snapshot());
    }

    Ok(())
}

fn print_params(params: &RiskParameters) {
    let instrument = params.instrument();
    println!("Instrument:   {} ({})", instrument.symbol, instrument.name);
    println!("Balance:      ${} ({})", params.balance(), instrument.currency);
    println!("Risk:         {}% = ${}", params.risk_percent(), params.risk_cash());
    println!("Stop Loss:    ${}", params.sl_distance());
    println!(
        "Lot Step:     {} (min {}, max {})",
        instrument.step_size, instrument.min_size, instrument.max_size
    );
}

fn print_result(params: &RiskParameters) {
    println!("\n--- Required Position Size ---");
    match params.result() {
        Some(result) => {
            println!("{}", result);
            if result.is_valid {
                println!(
                    "= {} Units of {}",
                    result.lots,
                    params.instrument().symbol
                );
            }
        }
        None => println!("Enter parameters..."),
    }
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  balance <v>    set account balance (updates risk cash)");
    println!("  percent <v>    set risk percent (updates risk cash)");
    println!("  cash <v>       set risk cash (updates risk percent)");
    println!("  sl <v>         set stop-loss distance");
    println!("  symbol <s>     select instrument (e.g. BTC/USD or btc)");
    println!("  show           print parameters and result");
    println!("  status         print session and save status");
    println!("  login <id> [email]");
    println!("  logout");
    println!("  quit");
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
