use serde::{Deserialize, Serialize};
use std::path::Path;

/// How parameter nodes feeding the root are arranged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// Inputs fan out to the left of the node that consumes them.
    #[default]
    LeftSide,
    /// A single input chain is stacked in a column below the root.
    Helixing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub padding_x: f32,
    pub padding_y: f32,
    pub center_branches: bool,
    pub num_required_branches: usize,
    pub parameter_style: ParameterStyle,
    pub limit_helixing_height: bool,
    pub helixing_height_max: f32,
    pub single_node_max_height: f32,
    pub expand_parameters_by_height: bool,
    pub vertical_pin_spacing: f32,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            padding_x: 40.0,
            padding_y: 25.0,
            center_branches: false,
            num_required_branches: 3,
            parameter_style: ParameterStyle::LeftSide,
            limit_helixing_height: true,
            helixing_height_max: 500.0,
            single_node_max_height: 300.0,
            expand_parameters_by_height: false,
            vertical_pin_spacing: 26.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub formatter: FormatterConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterConfigFile {
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    center_branches: Option<bool>,
    num_required_branches: Option<usize>,
    parameter_style: Option<ParameterStyle>,
    limit_helixing_height: Option<bool>,
    helixing_height_max: Option<f32>,
    single_node_max_height: Option<f32>,
    expand_parameters_by_height: Option<bool>,
    vertical_pin_spacing: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    parameter: Option<ParameterConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Merges a camelCase JSON (or JSON5) config document onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}"))?,
    };

    if let Some(param) = parsed.parameter {
        let formatter = &mut config.formatter;
        if let Some(v) = param.padding_x {
            formatter.padding_x = v;
        }
        if let Some(v) = param.padding_y {
            formatter.padding_y = v;
        }
        if let Some(v) = param.center_branches {
            formatter.center_branches = v;
        }
        if let Some(v) = param.num_required_branches {
            formatter.num_required_branches = v;
        }
        if let Some(v) = param.parameter_style {
            formatter.parameter_style = v;
        }
        if let Some(v) = param.limit_helixing_height {
            formatter.limit_helixing_height = v;
        }
        if let Some(v) = param.helixing_height_max {
            formatter.helixing_height_max = v;
        }
        if let Some(v) = param.single_node_max_height {
            formatter.single_node_max_height = v;
        }
        if let Some(v) = param.expand_parameters_by_height {
            formatter.expand_parameters_by_height = v;
        }
        if let Some(v) = param.vertical_pin_spacing {
            formatter.vertical_pin_spacing = v;
        }
    }

    Ok(config)
}
