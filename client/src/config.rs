use anyhow::{format_err, Context, Result};
use configparser::ini::Ini;
use kardia_mining::{parse_units, Address, U256, DEFAULT_SLIPPAGE_BPS, TOKEN_DECIMALS};
use std::time::Duration;
use tracing::warn;

const SECTION: &str = "Global";
const DEFAULT_APPROVAL_THRESHOLD: &str = "0.1";
const DEFAULT_SWAP_DEADLINE_SECS: u64 = 1_200;
const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;

/// Immutable settings shared by every component. Built once at start-up.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// RPC endpoints in fallback order.
    pub http_urls: Vec<String>,
    /// Account to act for; the wallet's first account when unset.
    pub account: Option<Address>,
    pub controller: Address,
    pub usdt: Address,
    pub kdia: Address,
    pub wbtc: Address,
    pub router: Address,
    pub kdia_btcb_pair: Address,
    pub slippage_bps: u64,
    /// Allowance checked before unstake and claim.
    pub approval_threshold: U256,
    pub swap_deadline_secs: u64,
    pub receipt_poll: Duration,
}

fn required(config: &Ini, key: &str) -> Result<String> {
    let value = config
        .get(SECTION, key)
        .ok_or_else(|| format_err!("{} is missing from [{}]", key, SECTION))?;
    if value.trim().is_empty() {
        return Err(format_err!("{} must not be empty", key));
    }
    Ok(value.trim().to_string())
}

fn required_address(config: &Ini, key: &str) -> Result<Address> {
    let raw = required(config, key)?;
    let address: Address = raw
        .parse()
        .map_err(|err| format_err!("{} is not a valid address: {}", key, err))?;
    if address.is_zero() {
        warn!(key, "address is still the zero placeholder");
    }
    Ok(address)
}

fn optional_u64(config: &Ini, key: &str, default: u64) -> Result<u64> {
    match config.get(SECTION, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be an unsigned integer", key)),
        _ => Ok(default),
    }
}

impl ClientConfig {
    pub fn from_ini(config: &Ini) -> Result<Self> {
        let http_urls: Vec<String> = required(config, "http_urls")?
            .split(',')
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if http_urls.is_empty() {
            return Err(format_err!("http_urls must list at least one endpoint"));
        }

        let account = match config.get(SECTION, "account") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|err| format_err!("account is not a valid address: {}", err))?,
            ),
            _ => None,
        };

        let slippage_bps = optional_u64(config, "slippage_bps", DEFAULT_SLIPPAGE_BPS)?;
        if slippage_bps > kardia_mining::BPS_DENOMINATOR {
            return Err(format_err!("slippage_bps must not exceed 10000"));
        }

        let threshold = config
            .get(SECTION, "approval_threshold")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APPROVAL_THRESHOLD.to_string());
        let approval_threshold = parse_units(&threshold, TOKEN_DECIMALS)
            .map_err(|err| format_err!("approval_threshold: {}", err))?;

        Ok(ClientConfig {
            http_urls,
            account,
            controller: required_address(config, "controller")?,
            usdt: required_address(config, "usdt")?,
            kdia: required_address(config, "kdia")?,
            wbtc: required_address(config, "wbtc")?,
            router: required_address(config, "router")?,
            kdia_btcb_pair: required_address(config, "kdia_btcb_pair")?,
            slippage_bps,
            approval_threshold,
            swap_deadline_secs: optional_u64(
                config,
                "swap_deadline_secs",
                DEFAULT_SWAP_DEADLINE_SECS,
            )?,
            receipt_poll: Duration::from_millis(optional_u64(
                config,
                "receipt_poll_ms",
                DEFAULT_RECEIPT_POLL_MS,
            )?),
        })
    }
}

pub fn load_cfg(client_config: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .load(client_config)
        .map_err(|err| format_err!("failed to read {}: {}", client_config, err))?;
    ClientConfig::from_ini(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Global]
http_urls = https://rpc-bsc.48.club, https://bscrpc.pancakeswap.finance
controller = 0x1111111111111111111111111111111111111111
usdt = 0x55d398326f99059fF775485246999027B3197955
kdia = 0x2222222222222222222222222222222222222222
wbtc = 0x7130d2A12B9BCbFAe4f2634d864A1Ee1Ce3Ead9c
router = 0x10ED43C718714eb63d5aA57B78B54704E256024E
kdia_btcb_pair = 0xD11c2c4881a69f9943D85d6317432Eb8Ec8aaAa2
";

    fn parse(text: &str) -> Result<ClientConfig> {
        let mut ini = Ini::new();
        ini.read(text.to_string()).map_err(|err| format_err!(err))?;
        ClientConfig::from_ini(&ini)
    }

    #[test]
    fn loads_required_keys_and_defaults() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.http_urls.len(), 2);
        assert_eq!(config.http_urls[1], "https://bscrpc.pancakeswap.finance");
        assert_eq!(config.account, None);
        assert_eq!(config.slippage_bps, DEFAULT_SLIPPAGE_BPS);
        assert_eq!(config.approval_threshold, U256::exp10(17));
        assert_eq!(config.swap_deadline_secs, DEFAULT_SWAP_DEADLINE_SECS);
        assert_eq!(config.receipt_poll, Duration::from_millis(DEFAULT_RECEIPT_POLL_MS));
    }

    #[test]
    fn optional_keys_override_defaults() {
        let text = format!(
            "{}slippage_bps = 300\nreceipt_poll_ms = 250\naccount = 0x3333333333333333333333333333333333333333\n",
            SAMPLE
        );
        let config = parse(&text).unwrap();
        assert_eq!(config.slippage_bps, 300);
        assert_eq!(config.receipt_poll, Duration::from_millis(250));
        assert_eq!(config.account, Some(Address([0x33; 20])));
    }

    #[test]
    fn shipped_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/client_config.ini");
        let config = load_cfg(path).unwrap();
        assert_eq!(config.http_urls.len(), 2);
        assert!(config.controller.is_zero());
        assert_eq!(config.slippage_bps, DEFAULT_SLIPPAGE_BPS);
    }

    #[test]
    fn missing_or_bad_addresses_are_errors() {
        let without_router = SAMPLE.replace("router = 0x10ED43C718714eb63d5aA57B78B54704E256024E\n", "");
        assert!(parse(&without_router).is_err());
        let bad_usdt = SAMPLE.replace("0x55d398326f99059fF775485246999027B3197955", "0x...");
        assert!(parse(&bad_usdt).is_err());
        let wide_slippage = format!("{}slippage_bps = 20000\n", SAMPLE);
        assert!(parse(&wide_slippage).is_err());
    }
}
