// file: src/stages/templates.rs
// version: 1.0.0
// guid: 0f7e6d5c-4b3a-4291-8e7f-6a5b4c3d2e1f

//! Embedded templates for the files written by stage documents

use crate::Result;
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;

pub const RANCHERD_CONFIG: &str = "rancherd-config";
pub const RKE2_SERVER_CONFIG: &str = "rke2-90-harvester-server";
pub const RKE2_AGENT_CONFIG: &str = "rke2-90-harvester-agent";
pub const CANAL_CONFIG: &str = "rke2-canal-config";
pub const IFCFG_DHCP: &str = "ifcfg-dhcp";
pub const IFCFG_STATIC: &str = "ifcfg-static";
pub const IFROUTE: &str = "ifroute";
pub const IFCFG_WLAN: &str = "ifcfg-wlan";

const TEMPLATES: &[(&str, &str)] = &[
    (RANCHERD_CONFIG, include_str!("../../templates/rancherd-config.yaml")),
    (RKE2_SERVER_CONFIG, include_str!("../../templates/rke2-90-harvester-server.yaml")),
    (RKE2_AGENT_CONFIG, include_str!("../../templates/rke2-90-harvester-agent.yaml")),
    (CANAL_CONFIG, include_str!("../../templates/rke2-canal-config.yaml")),
    (IFCFG_DHCP, include_str!("../../templates/ifcfg-dhcp")),
    (IFCFG_STATIC, include_str!("../../templates/ifcfg-static")),
    (IFROUTE, include_str!("../../templates/ifroute")),
    (IFCFG_WLAN, include_str!("../../templates/ifcfg-wlan")),
];

// Double-quoted YAML/shell scalar
handlebars_helper!(quote: |v: str| serde_json::to_string(v).unwrap_or_default());

/// Handlebars registry with HTML escaping disabled and missing keys rendered
/// as empty strings
pub fn registry() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    hb.register_escape_fn(no_escape);
    hb.register_helper("quote", Box::new(quote));
    hb
}

/// Renders the embedded templates
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = registry();
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.registry.render(name, data)?)
    }
}
