mod diff;
mod exports;
mod info;
mod list;
mod synth;

pub use diff::cmd_diff;
pub use exports::cmd_exports;
pub use info::cmd_info;
pub use list::cmd_list;
pub use synth::cmd_synth;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use vttcloud_lib::consts::SECRET_ARN_ENV;
use vttcloud_lib::template::TemplateFormat;
use vttcloud_lib::{App, AppKind, FoundryOptions, StackConfig};

/// Options for the full Foundry stack; ignored by the other apps.
#[derive(Debug, Clone, Default, Args)]
pub struct FoundryArgs {
  /// Put a CloudFront distribution in front of the load balancer
  #[arg(long)]
  pub cdn: bool,

  /// Complete ARN of the Secrets Manager secret with the Foundry credentials
  #[arg(long, env = SECRET_ARN_ENV, value_name = "ARN")]
  pub secret_arn: Option<String>,
}

impl FoundryArgs {
  pub fn options(&self) -> FoundryOptions {
    let mut options = FoundryOptions {
      cdn: self.cdn,
      ..FoundryOptions::default()
    };
    if let Some(arn) = self.secret_arn.as_deref().filter(|arn| !arn.is_empty()) {
      options.secret_arn = arn.to_string();
    }
    options
  }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum TemplateFormatArg {
  #[default]
  Json,
  Yaml,
}

impl From<TemplateFormatArg> for TemplateFormat {
  fn from(arg: TemplateFormatArg) -> Self {
    match arg {
      TemplateFormatArg::Json => TemplateFormat::Json,
      TemplateFormatArg::Yaml => TemplateFormat::Yaml,
    }
  }
}

pub(crate) fn build_app(config: &StackConfig, kind: AppKind, foundry: &FoundryArgs) -> Result<App> {
  App::build(kind, config, &foundry.options()).with_context(|| format!("Failed to build {} app for {}", kind, config))
}
