// Managed unit data models

use crate::error::HostprovError;
use crate::systemd::units::{ServiceTemplateParams, TimerTemplateParams, UnitTemplate};
use std::path::{Path, PathBuf};

/// UnitKind is the systemd unit type, and the unit file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Service,
    Timer,
}

impl UnitKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            UnitKind::Service => "service",
            UnitKind::Timer => "timer",
        }
    }

    /// Timers are enabled and started on install, services are only triggered
    pub fn default_auto_start(&self) -> bool {
        matches!(self, UnitKind::Timer)
    }
}

/// One unit this tool generates and manages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    name: String,
    kind: UnitKind,
    source_dir: PathBuf,
    destination_path: PathBuf,
    auto_start: bool,
    template: UnitTemplate,
}

impl ServiceRecord {
    /// `{prefix}-{short_name}.{kind}`
    pub fn unit_name(prefix: &str, short_name: &str, kind: UnitKind) -> String {
        format!("{}-{}.{}", prefix, short_name, kind.suffix())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_timer(&self) -> bool {
        self.kind == UnitKind::Timer
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Where `create` stages the generated unit text
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.name)
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Unit this one points at (a timer's service)
    pub fn dependency(&self) -> Option<&str> {
        match &self.template {
            UnitTemplate::Timer(params) => Some(params.unit_name()),
            UnitTemplate::Service(_) => None,
        }
    }

    pub fn render(&self) -> String {
        self.template.render()
    }
}

/// Builds records sharing a name prefix and directories
#[derive(Debug, Clone)]
pub struct UnitSet {
    prefix: String,
    unit_dir: PathBuf,
    staging_dir: PathBuf,
}

impl UnitSet {
    pub fn new(
        prefix: impl Into<String>,
        unit_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            unit_dir: unit_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    fn record(&self, short_name: &str, kind: UnitKind, template: UnitTemplate) -> ServiceRecord {
        let name = ServiceRecord::unit_name(&self.prefix, short_name, kind);
        ServiceRecord {
            destination_path: self.unit_dir.join(&name),
            source_dir: self.staging_dir.clone(),
            name,
            kind,
            auto_start: kind.default_auto_start(),
            template,
        }
    }

    pub fn service(&self, short_name: &str, params: ServiceTemplateParams) -> ServiceRecord {
        self.record(short_name, UnitKind::Service, UnitTemplate::Service(params))
    }

    /// Timer named after `short_name` that activates `target`
    pub fn timer(
        &self,
        short_name: &str,
        target: &ServiceRecord,
    ) -> Result<ServiceRecord, HostprovError> {
        let params = TimerTemplateParams::new(target.name())?;
        Ok(self.record(short_name, UnitKind::Timer, UnitTemplate::Timer(params)))
    }
}
