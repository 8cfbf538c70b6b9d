pub mod price;
pub mod reward;
pub mod slippage;

pub use price::*;
pub use reward::*;
pub use slippage::*;
