pub mod abi;
pub mod controller_instructions;
pub mod router_instructions;
pub mod rpc;
pub mod token_instructions;
pub mod utils;
