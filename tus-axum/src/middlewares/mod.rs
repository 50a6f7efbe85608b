mod protocol;

pub use protocol::{TusProtocol, TusProtocolService};
