use std::error::Error;

use clap::Parser;
use rust_decimal::Decimal;

use tipjar::config::{Cli, Command, Config, RECENT_TIPS_SHOWN};
use tipjar::leaderboard;
use tipjar::ledger::{self, TipLedger, TipRecord};
use tipjar::registry::IdentityRegistry;
use tipjar::store::{db_path, SqliteStore};
use tipjar::{chain, logging, session, tiplog};

fn main() {
    logging::init();
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli.data_dir);
    let store = SqliteStore::open(&db_path(&config.data_dir))?;

    match cli.command {
        Command::Connect { address } => connect(&config, &address),
        Command::Disconnect => disconnect(&config),
        Command::Whoami => whoami(&config, &store),
        Command::Claim { username } => claim(&config, &store, &username),
        Command::Tip {
            username,
            amount,
            message,
        } => tip(&config, &store, &username, &amount, &message),
        Command::Tips { username } => list_tips(&store, &username),
        Command::Stats { username } => stats(&store, &username),
        Command::Leaderboard => show_leaderboard(&store),
    }
}

fn connect(config: &Config, address: &str) -> Result<(), Box<dyn Error>> {
    session::connect(&config.data_dir, address)?;
    println!("wallet connected: {address}");
    Ok(())
}

fn disconnect(config: &Config) -> Result<(), Box<dyn Error>> {
    session::disconnect(&config.data_dir)?;
    println!("wallet disconnected");
    Ok(())
}

fn whoami(config: &Config, store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    match session::current(&config.data_dir)? {
        Some(address) => {
            println!("address: {address}");
            match IdentityRegistry::new(store).lookup_username(&address)? {
                Some(username) => println!("username: @{username}"),
                None => println!("username: (none claimed)"),
            }
            Ok(())
        }
        None => {
            println!("no wallet connected");
            Ok(())
        }
    }
}

fn claim(config: &Config, store: &SqliteStore, username: &str) -> Result<(), Box<dyn Error>> {
    let address = session::require_connected(&config.data_dir)?;
    let username = IdentityRegistry::new(store).register(&address, username)?;
    tiplog!(
        "claim: {} -> {}",
        chain::shorten_address(&address, 4),
        logging::username(&username)
    );
    println!("tip page ready: @{username}");
    Ok(())
}

fn tip(
    config: &Config,
    store: &SqliteStore,
    username: &str,
    amount: &str,
    message: &str,
) -> Result<(), Box<dyn Error>> {
    let sender = session::require_connected(&config.data_dir)?;

    // Floor to micro-STX precision before anything is recorded, the same
    // rounding the contract call would apply.
    let micro = chain::parse_stx(amount)
        .ok_or_else(|| format!("not a valid STX amount: {amount}"))?;
    let amount = Decimal::from(micro) / Decimal::from(chain::MICRO_STX_PER_STX);
    ledger::validate_tip(amount, message)?;

    let recipient = IdentityRegistry::new(store)
        .lookup_address(username)?
        .ok_or_else(|| format!("no tip page for @{username}"))?;

    let tx_id = chain::broadcast_tip(&sender, &recipient, amount, message);
    TipLedger::new(store).append(
        username,
        TipRecord {
            sender,
            recipient,
            amount,
            message: message.to_string(),
            timestamp: ledger::now_millis(),
            tx_id: tx_id.clone(),
        },
    )?;

    tiplog!(
        "tip: {} STX -> {} ({})",
        chain::format_stx(micro),
        logging::username(username),
        logging::tx_id(&tx_id)
    );
    println!("sent {} STX to @{username}", chain::format_stx(micro));
    println!("txid: {tx_id}");
    println!("explorer: {}", chain::explorer_tx_url(&tx_id));
    Ok(())
}

fn list_tips(store: &SqliteStore, username: &str) -> Result<(), Box<dyn Error>> {
    let tips = TipLedger::new(store).tips(username)?;
    if tips.is_empty() {
        println!("@{username} has not received any tips yet");
        return Ok(());
    }

    let stats = leaderboard::user_stats(store, username)?;
    println!(
        "@{username}: {} STX across {} tip(s)",
        stats.total_received, stats.total_tips
    );
    for tip in tips.iter().take(RECENT_TIPS_SHOWN) {
        let when = logging::format_timestamp_millis(tip.timestamp);
        let from = chain::shorten_address(&tip.sender, 4);
        if tip.message.is_empty() {
            println!("  {when}  {from}  {} STX", tip.amount);
        } else {
            println!("  {when}  {from}  {} STX  \"{}\"", tip.amount, tip.message);
        }
    }
    if tips.len() > RECENT_TIPS_SHOWN {
        println!("  ... and {} more", tips.len() - RECENT_TIPS_SHOWN);
    }
    Ok(())
}

fn stats(store: &SqliteStore, username: &str) -> Result<(), Box<dyn Error>> {
    let stats = leaderboard::user_stats(store, username)?;
    println!("@{username}");
    println!("  total received: {} STX", stats.total_received);
    println!("  tips: {}", stats.total_tips);
    Ok(())
}

fn rank_icon(index: usize) -> String {
    match index {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        _ => format!("#{}", index + 1),
    }
}

fn show_leaderboard(store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    let board = leaderboard::leaderboard(store)?;
    if board.is_empty() {
        println!("no tips received yet");
        return Ok(());
    }

    let totals = leaderboard::global_totals(&board);
    println!(
        "{} user(s), {} tip(s), {} STX total volume",
        totals.total_users, totals.total_tips, totals.total_volume
    );
    println!();
    for (index, entry) in board.iter().enumerate() {
        println!(
            "  {:<4} @{:<20} {:>12} STX  {} tip(s)  {}",
            rank_icon(index),
            entry.username,
            entry.total_received.to_string(),
            entry.total_tips,
            chain::shorten_address(&entry.address, 4),
        );
    }
    Ok(())
}
