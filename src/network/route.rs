// Default route discovery from `ip route` / `ip -br addr show`

use crate::shell::{CommandRunner, ShellCommand};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultRoute {
    pub interface: Option<String>,
    pub address: Option<String>,
    pub gateway: Option<String>,
}

/// First `default ...` line of `ip route`
pub fn parse_default_route(ip_route: &str) -> Option<DefaultRoute> {
    let line = ip_route
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("default"))?;

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let after = |key: &str| {
        tokens
            .iter()
            .position(|token| *token == key)
            .and_then(|i| tokens.get(i + 1))
            .map(|value| value.to_string())
    };

    Some(DefaultRoute {
        interface: after("dev"),
        address: None,
        gateway: after("via"),
    })
}

/// `(interface, first address)` pairs from `ip -br addr show`
pub fn parse_brief_addresses(output: &str) -> Vec<(String, Option<String>)> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return None;
            }
            // veth names look like "eth0@if12"
            let interface = parts[0].split('@').next().unwrap_or(parts[0]).to_string();
            let address = parts
                .get(2)
                .filter(|cidr| cidr.contains('/'))
                .and_then(|cidr| cidr.split('/').next())
                .map(str::to_string);
            Some((interface, address))
        })
        .collect()
}

/// Query the host's default route; `None` when there is none
pub async fn probe_default_route<R: CommandRunner>(runner: &R) -> Option<DefaultRoute> {
    let routes = runner.capture(&ShellCommand::new("ip").arg("route")).await?;
    let mut route = parse_default_route(&routes.stdout)?;

    if let Some(interface) = route.interface.clone() {
        let addresses = runner
            .capture(&ShellCommand::new("ip").args(["-br", "addr", "show"]))
            .await
            .map(|output| parse_brief_addresses(&output.stdout))
            .unwrap_or_default();
        route.address = addresses
            .into_iter()
            .find(|(name, _)| *name == interface)
            .and_then(|(_, address)| address);
    }

    Some(route)
}
