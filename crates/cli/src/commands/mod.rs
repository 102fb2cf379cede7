//! One module per subcommand; each exposes a single `run` function.

pub mod ask;
pub mod doctor;
pub mod onboard;
pub mod serve;
pub mod tools;
