// Systemd unit generation and lifecycle

pub mod models;
pub mod orchestrator;
pub mod units;


pub use models::{ServiceRecord, UnitKind, UnitSet};
pub use orchestrator::ServiceOrchestrator;
pub use units::{ServiceTemplateParams, TimerTemplateParams, UnitTemplate};
