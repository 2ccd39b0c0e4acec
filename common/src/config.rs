use serde::{Deserialize, Serialize};

use crate::{
    metrics::MissingBaselinePolicy,
    plot::{ImageFormat, Plot},
    render::Canvas,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    /// Views to render, the default views when absent
    pub plots: Option<Vec<Box<dyn Plot>>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            settings: Settings::default(),
            plots: None,
        }
    }
}

fn default_name() -> String {
    "report".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub missing_baseline: MissingBaselinePolicy,
    /// Also write speedup.csv and efficiency.csv next to the charts
    pub write_derived: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Svg,
            width: 1000,
            height: 600,
            missing_baseline: MissingBaselinePolicy::Abort,
            write_derived: true,
        }
    }
}

impl Settings {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            format: self.format,
            width: self.width,
            height: self.height,
        }
    }
}
