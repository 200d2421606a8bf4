// Network helpers: resolver file, connectivity, default route

pub mod connectivity;
pub mod dns;
pub mod ping;
pub mod route;


pub use connectivity::{ConnectivityChecker, ConnectivityReport, HostReport, ProbeSettings};
pub use dns::{DnsConfigurator, DnsOutcome};
pub use ping::{parse_ping_output, PingSummary};
pub use route::{probe_default_route, DefaultRoute};
