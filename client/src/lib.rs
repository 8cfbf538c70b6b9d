//! Chain-facing half of the Kardia mining client: the JSON-RPC adapter,
//! polled read views, and the approve-then-act transaction flows.

pub mod chain;
pub mod config;
pub mod flows;
pub mod instructions;
pub mod poller;
pub mod views;

#[cfg(test)]
mod test_utils;
