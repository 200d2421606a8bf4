// Unit file text generation

use crate::error::HostprovError;

/// Timer fires this long after boot...
pub const TIMER_BOOT_DELAY: &str = "60sec";
/// ...and then this long after each activation of its unit
pub const TIMER_PERIOD: &str = "1h";

fn validate(field: &str, value: &str) -> Result<(), HostprovError> {
    if value.trim().is_empty() {
        return Err(HostprovError::InvalidTemplate(format!("{} cannot be empty", field)));
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(HostprovError::InvalidTemplate(format!(
            "{} cannot span multiple lines",
            field
        )));
    }
    Ok(())
}

/// Parameters for a oneshot service unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTemplateParams {
    description: String,
    exec_start: String,
}

impl ServiceTemplateParams {
    pub fn new(
        description: impl Into<String>,
        exec_start: impl Into<String>,
    ) -> Result<Self, HostprovError> {
        let description = description.into();
        let exec_start = exec_start.into();
        validate("Description", &description)?;
        validate("ExecStart", &exec_start)?;
        Ok(Self {
            description,
            exec_start,
        })
    }

    pub fn exec_start(&self) -> &str {
        &self.exec_start
    }
}

/// Parameters for a timer that activates `unit_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTemplateParams {
    unit_name: String,
}

impl TimerTemplateParams {
    pub fn new(unit_name: impl Into<String>) -> Result<Self, HostprovError> {
        let unit_name = unit_name.into();
        validate("Unit", &unit_name)?;
        if unit_name.contains(char::is_whitespace) {
            return Err(HostprovError::InvalidTemplate(format!(
                "Unit name '{}' contains whitespace",
                unit_name
            )));
        }
        Ok(Self { unit_name })
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }
}

/// Which template a unit is rendered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitTemplate {
    Service(ServiceTemplateParams),
    Timer(TimerTemplateParams),
}

impl UnitTemplate {
    pub fn render(&self) -> String {
        match self {
            UnitTemplate::Service(params) => render_service(params),
            UnitTemplate::Timer(params) => render_timer(params),
        }
    }
}

pub fn render_service(params: &ServiceTemplateParams) -> String {
    let mut content = String::new();

    content.push_str("[Unit]\n");
    content.push_str(&format!("Description={}\n", params.description));
    content.push_str("After=network.target\n");
    content.push('\n');

    content.push_str("[Service]\n");
    content.push_str("Type=oneshot\n");
    content.push_str(&format!("ExecStart={}\n", params.exec_start));

    content
}

pub fn render_timer(params: &TimerTemplateParams) -> String {
    let mut content = String::new();

    content.push_str("[Unit]\n");
    content.push_str(&format!("Description=Timer for running {}\n", params.unit_name));
    content.push('\n');

    content.push_str("[Timer]\n");
    content.push_str(&format!("OnBootSec={}\n", TIMER_BOOT_DELAY));
    content.push_str(&format!("OnUnitActiveSec={}\n", TIMER_PERIOD));
    content.push_str(&format!("Unit={}\n", params.unit_name));
    content.push('\n');

    content.push_str("[Install]\n");
    content.push_str("WantedBy=timers.target\n");

    content
}
