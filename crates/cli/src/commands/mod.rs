pub mod classify;
pub mod resolve;
pub mod settings;
pub mod util;

pub use classify::*;
pub use resolve::*;
pub use settings::*;
pub use util::*;
