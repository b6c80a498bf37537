//! Stacks settlement stub and STX display helpers.
//!
//! The live `send-tip` contract call is intentionally not wired up: tips
//! are recorded locally with a randomly generated transaction id of the
//! same shape a broadcast would return. The contract coordinates and
//! network endpoints are kept so the real path can be enabled later
//! without touching callers.

use rand::RngCore;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const CONTRACT_ADDRESS: &str = "SP000000000000000000002Q6VF78";
pub const CONTRACT_NAME: &str = "tip-jar";
pub const STACKS_EXPLORER: &str = "https://explorer.hiro.so";
pub const STACKS_API: &str = "https://api.mainnet.hiro.so";

pub const MICRO_STX_PER_STX: u64 = 1_000_000;

/// Stand-in for the on-chain `send-tip` call. The arguments mirror the
/// contract signature; only the demo txid is produced.
pub fn broadcast_tip(_sender: &str, _recipient: &str, _amount: Decimal, _message: &str) -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// Parse an STX amount string into micro-STX, flooring anything below
/// one micro-STX. `None` for unparsable or negative input.
pub fn parse_stx(stx: &str) -> Option<u64> {
    let amount: Decimal = stx.trim().parse().ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    (amount * Decimal::from(MICRO_STX_PER_STX)).floor().to_u64()
}

/// Format micro-STX as a decimal STX string with six places.
pub fn format_stx(micro_stx: u64) -> String {
    format!(
        "{}.{:06}",
        micro_stx / MICRO_STX_PER_STX,
        micro_stx % MICRO_STX_PER_STX
    )
}

/// `SP3FBR...8WVS` style truncation for display. Short addresses pass
/// through untouched.
pub fn shorten_address(address: &str, chars: usize) -> String {
    if address.len() <= chars * 2 + 2 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..chars + 2],
        &address[address.len() - chars..]
    )
}

/// Explorer page for a transaction id.
pub fn explorer_tx_url(tx_id: &str) -> String {
    format!("{STACKS_EXPLORER}/txid/{tx_id}?chain=mainnet")
}
