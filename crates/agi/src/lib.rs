//! AGI adapter: runs the reservation call over the line protocol a PBX
//! speaks on a script's stdin and stdout.

pub mod channel;
pub mod environment;
pub mod reply;

use tokio::io::{BufReader, Stdin, Stdout};

use ivrbook_core::errors::TelephonyError;

pub use channel::AgiChannel;
pub use environment::AgiEnvironment;
pub use reply::{AgiReply, ReplyLine};

pub type StdioChannel = AgiChannel<BufReader<Stdin>, Stdout>;

/// Channel bound to the process's stdin and stdout, as when the PBX
/// launches the binary as an AGI script.
pub async fn connect_stdio() -> Result<StdioChannel, TelephonyError> {
    AgiChannel::connect(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
