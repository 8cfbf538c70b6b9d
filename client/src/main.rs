use anyhow::{format_err, Result};
use clap::Parser;
use colorful::{Color, Colorful};
use kardia_client::chain::{Clock, SystemClock, Wallet};
use kardia_client::config::{load_cfg, ClientConfig};
use kardia_client::flows::{Action, TransactionSequencer};
use kardia_client::instructions::rpc::JsonRpcClient;
use kardia_client::views::{
    fetch_balances, fetch_drip, fetch_kdia_price, fetch_pools, fetch_rewards, price_label,
    refresh_on_confirmed, MarketViews, RewardSnapshot, RewardView,
};
use kardia_mining::states::{SequencerEvent, TxKind};
use kardia_mining::{
    format_units, parse_units, Address, ErrorCode, U256, REWARD_POLL_INTERVAL_SECS,
    TOKEN_DECIMALS,
};
use serde::Serialize;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
pub struct Opts {
    /// INI file with endpoints and contract addresses.
    #[arg(long, default_value = "client_config.ini")]
    pub config: String,
    /// Print read results as JSON.
    #[arg(long)]
    pub json: bool,
    #[clap(subcommand)]
    pub command: KardiaCommands,
}

#[derive(Debug, Parser)]
pub enum KardiaCommands {
    /// Power units, stake, pending reward and lock status.
    Stats {
        #[arg(long)]
        user: Option<Address>,
    },
    /// Emission rate per second and per day.
    Drip {},
    Pools {},
    Price {},
    Balances {
        #[arg(long)]
        user: Option<Address>,
    },
    /// Keep every view live and print it on each poll. Lines on stdin such
    /// as `claim` or `stake 5` run as actions; confirmations refresh the views.
    Watch {
        /// Stop after this many refreshes; 0 runs until interrupted.
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
    /// Estimate KDIA out for a USDT amount.
    Quote {
        #[arg(long)]
        amount_in: String,
    },
    AcquirePower {
        #[arg(long)]
        amount: String,
    },
    Stake {
        #[arg(long)]
        amount: String,
    },
    /// Withdraw staked KDIA; the whole stake when no amount is given.
    Unstake {
        #[arg(long)]
        amount: Option<String>,
    },
    Claim {},
    Swap {
        #[arg(long)]
        amount_in: String,
    },
}

fn parse_amount(value: &str) -> Result<U256> {
    parse_units(value, TOKEN_DECIMALS).map_err(|err| format_err!("{}: {}", value, err))
}

fn amount(value: U256) -> String {
    format_units(value, TOKEN_DECIMALS, 4)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_failure(err: &ErrorCode) {
    if let Some(message) = err.user_message() {
        eprintln!("{}", message.as_str().color(Color::Red));
    }
}

fn print_rewards(snapshot: &RewardSnapshot) {
    println!("Active Power Units : {}", amount(snapshot.position.power_units));
    println!("Staked Balance     : {}", amount(snapshot.position.staked));
    println!("Pending Reward     : {} KDIA", snapshot.pending_label());
    let status = snapshot.stake_status_label();
    if snapshot.lock.is_locked() {
        println!("Vault Status       : {}", status.as_str().color(Color::Yellow));
    } else {
        println!("Vault Status       : {}", status.as_str().color(Color::Cyan));
    }
}

fn print_progress(event: &SequencerEvent) {
    match event {
        SequencerEvent::ApprovalSubmitted { hash, .. } => {
            println!("{} {}", TxKind::Approve.progress_label(), hash)
        }
        SequencerEvent::ApprovalConfirmed { .. } => {}
        SequencerEvent::Submitted { kind, hash } => println!("{} {}", kind.progress_label(), hash),
        SequencerEvent::Confirmed { hash, .. } => {
            println!("{} {}", "CONFIRMED".color(Color::Green), hash)
        }
        SequencerEvent::Failed { .. } => {}
    }
}

fn resolve_account(config: &ClientConfig, wallet: &JsonRpcClient) -> Result<Address> {
    match config.account {
        Some(account) => Ok(account),
        None => wallet
            .account()
            .map_err(|err| format_err!("no account configured and wallet lookup failed: {}", err)),
    }
}

fn run_action(
    sequencer: &TransactionSequencer<JsonRpcClient>,
    chain: &JsonRpcClient,
    config: &ClientConfig,
    clock: &dyn Clock,
    owner: Address,
    action: Action,
) {
    if let Err(err) = sequencer.execute(owner, action) {
        report_failure(&err);
        return;
    }
    // Confirmed: show the state the transaction produced.
    match fetch_rewards(chain, config.controller, owner, clock.now()) {
        Ok(snapshot) => print_rewards(&snapshot),
        Err(err) => report_failure(&err),
    }
    if let Ok(balances) = fetch_balances(chain, config, owner) {
        for (token, value) in balances.labels() {
            println!("{:<19}: {}", token, value);
        }
    }
}

/// Parse one `watch` input line; blank lines yield `None`.
fn parse_action(line: &str) -> Result<Option<Action>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let action = match words.as_slice() {
        [] => return Ok(None),
        ["acquire-power", value] => Action::AcquirePower(parse_amount(value)?),
        ["stake", value] => Action::Stake(parse_amount(value)?),
        ["unstake"] => Action::Unstake(U256::MAX),
        ["unstake", value] => Action::Unstake(parse_amount(value)?),
        ["claim"] => Action::ClaimReward,
        ["swap", value] => Action::Swap {
            amount_in: parse_amount(value)?,
            quote: None,
        },
        _ => return Err(format_err!("unknown command: {}", line.trim())),
    };
    Ok(Some(action))
}

fn read_actions(sequencer: Arc<TransactionSequencer<JsonRpcClient>>, owner: Address) -> Result<()> {
    thread::Builder::new()
        .name("watch-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                match parse_action(&line) {
                    Ok(Some(action)) => {
                        if let Err(err) = sequencer.execute(owner, action) {
                            report_failure(&err);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => eprintln!("{}", err.to_string().as_str().color(Color::Red)),
                }
            }
        })?;
    Ok(())
}

fn watch(
    chain: Arc<JsonRpcClient>,
    clock: Arc<dyn Clock>,
    config: Arc<ClientConfig>,
    sequencer: Arc<TransactionSequencer<JsonRpcClient>>,
    owner: Address,
    ticks: u64,
) -> Result<()> {
    let rewards = RewardView::start(chain.clone(), clock, config.controller, owner)?;
    let market = MarketViews::start(chain, config, owner)?;
    let mut handles = market.refresh_handles();
    handles.push(rewards.refresh_handle());
    refresh_on_confirmed(&sequencer, handles);
    read_actions(sequencer, owner)?;
    let mut printed = 0u64;
    loop {
        thread::sleep(Duration::from_secs(REWARD_POLL_INTERVAL_SECS));
        println!("{}", "-".repeat(40));
        match rewards.view().get().ready() {
            Some(snapshot) => print_rewards(snapshot),
            None => println!("Pending Reward     : {}", rewards.view().get().render(|s| s.pending_label())),
        }
        println!("KDIA Drip / 24H    : {}", market.drip.get().render(|d| d.per_day_label()));
        println!("KDIA Price (USDT)  : {}", market.price.get().render(|p| price_label(p.as_ref())));
        if let Some(balances) = market.balances.get().ready() {
            for (token, value) in balances.labels() {
                println!("{:<19}: {}", token, value);
            }
        }
        printed += 1;
        if ticks != 0 && printed >= ticks {
            return Ok(());
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let config = Arc::new(load_cfg(&opts.config)?);
    let chain = Arc::new(JsonRpcClient::new(config.http_urls.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    info!(endpoints = config.http_urls.len(), "client configured");
    let sequencer = Arc::new(TransactionSequencer::new(
        chain.clone(),
        clock.clone(),
        config.clone(),
    ));
    sequencer.subscribe(print_progress);

    match opts.command {
        KardiaCommands::Stats { user } => {
            let user = match user {
                Some(user) => user,
                None => resolve_account(&config, &chain)?,
            };
            match fetch_rewards(chain.as_ref(), config.controller, user, clock.now()) {
                Ok(snapshot) if opts.json => print_json(&snapshot)?,
                Ok(snapshot) => print_rewards(&snapshot),
                Err(err) => report_failure(&err),
            }
        }
        KardiaCommands::Drip {} => match fetch_drip(chain.as_ref(), config.controller) {
            Ok(drip) if opts.json => print_json(&drip)?,
            Ok(drip) => {
                println!("KDIA Drip / 24H : {}", drip.per_day_label());
                println!("KDIA Drip / sec : {}", drip.rate_label());
            }
            Err(err) => report_failure(&err),
        },
        KardiaCommands::Pools {} => match fetch_pools(chain.as_ref(), config.controller) {
            Ok(pools) if opts.json => print_json(&pools)?,
            Ok(pools) => {
                for (name, value) in pools.labels() {
                    println!("{:<12}: {}", name, value);
                }
            }
            Err(err) => report_failure(&err),
        },
        KardiaCommands::Price {} => {
            let price = fetch_kdia_price(chain.as_ref(), &config);
            if opts.json {
                print_json(&price)?;
            } else {
                println!("KDIA Price (USDT) : {}", price_label(price.as_ref()));
            }
        }
        KardiaCommands::Balances { user } => {
            let user = match user {
                Some(user) => user,
                None => resolve_account(&config, &chain)?,
            };
            match fetch_balances(chain.as_ref(), &config, user) {
                Ok(balances) if opts.json => print_json(&balances)?,
                Ok(balances) => {
                    for (token, value) in balances.labels() {
                        println!("{:<5}: {}", token, value);
                    }
                }
                Err(err) => report_failure(&err),
            }
        }
        KardiaCommands::Watch { ticks } => {
            let owner = resolve_account(&config, &chain)?;
            watch(chain, clock, config, sequencer, owner, ticks)?;
        }
        KardiaCommands::Quote { amount_in } => {
            let amount_in = parse_amount(&amount_in)?;
            match sequencer.quoter().quote(amount_in) {
                Ok(quote) if opts.json => print_json(&quote)?,
                Ok(quote) => {
                    let min_out = quote.minimum_out(config.slippage_bps)?;
                    println!("Route       : {}", quote.route);
                    println!("Estimated   : {} KDIA", amount(quote.amount_out));
                    println!("Minimum out : {} KDIA", amount(min_out));
                }
                Err(err) => report_failure(&err),
            }
        }
        KardiaCommands::AcquirePower { amount } => {
            let action = Action::AcquirePower(parse_amount(&amount)?);
            let owner = resolve_account(&config, &chain)?;
            run_action(&sequencer, &chain, &config, clock.as_ref(), owner, action);
        }
        KardiaCommands::Stake { amount } => {
            let action = Action::Stake(parse_amount(&amount)?);
            let owner = resolve_account(&config, &chain)?;
            run_action(&sequencer, &chain, &config, clock.as_ref(), owner, action);
        }
        KardiaCommands::Unstake { amount } => {
            let requested = match amount {
                Some(amount) => parse_amount(&amount)?,
                None => U256::MAX,
            };
            let owner = resolve_account(&config, &chain)?;
            run_action(&sequencer, &chain, &config, clock.as_ref(), owner, Action::Unstake(requested));
        }
        KardiaCommands::Claim {} => {
            let owner = resolve_account(&config, &chain)?;
            run_action(&sequencer, &chain, &config, clock.as_ref(), owner, Action::ClaimReward);
        }
        KardiaCommands::Swap { amount_in } => {
            let amount_in = parse_amount(&amount_in)?;
            let owner = resolve_account(&config, &chain)?;
            let quote = match sequencer.quoter().quote(amount_in) {
                Ok(quote) => quote,
                Err(err) => {
                    report_failure(&err);
                    return Ok(());
                }
            };
            println!(
                "{} USDT -> {} KDIA via {}",
                amount(amount_in),
                amount(quote.amount_out),
                quote.route
            );
            let action = Action::Swap {
                amount_in,
                quote: Some(quote),
            };
            run_action(&sequencer, &chain, &config, clock.as_ref(), owner, action);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_input_maps_to_actions() {
        assert_eq!(parse_action("  ").unwrap(), None);
        assert_eq!(parse_action("claim").unwrap(), Some(Action::ClaimReward));
        assert_eq!(
            parse_action("stake 1.5").unwrap(),
            Some(Action::Stake(U256::from(15u64) * U256::exp10(17)))
        );
        assert_eq!(parse_action("unstake").unwrap(), Some(Action::Unstake(U256::MAX)));
        assert_eq!(
            parse_action("swap 10").unwrap(),
            Some(Action::Swap {
                amount_in: U256::exp10(19),
                quote: None
            })
        );
        assert!(parse_action("stake").is_err());
        assert!(parse_action("stake ten").is_err());
    }
}
