pub mod bus;
pub mod parse;
pub mod types;

pub use bus::{CommandBus, CommandReceiver, CommandSender, Received};
pub use parse::{parse_assignment, parse_effect, parse_line, ParseError};
pub use types::{Command, CommandSource};
