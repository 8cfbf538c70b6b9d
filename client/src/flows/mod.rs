pub mod guard;
pub mod quoter;
pub mod sequencer;

pub use guard::*;
pub use quoter::*;
pub use sequencer::*;
