pub mod events;
pub use events::*;

pub mod lock;
pub use lock::*;

pub mod position;
pub use position::*;

pub mod route;
pub use route::*;

pub mod transaction;
pub use transaction::*;
