//! Config subcommand handlers.

use serde::Serialize;

use ecowatch_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

fn to_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# cannot render config: {e}"))
}

#[derive(Debug, Serialize)]
struct Paths {
    config: String,
    state: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let format = global.output.unwrap_or(OutputFormat::Table);
    let color = output::should_color(global.color);

    match args.command {
        // ── Init: write the starter file ────────────────────────────
        ConfigCommand::Init { force } => {
            let path = config::effective_config_path(global);
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (pass --force to overwrite)",
                        path.display()
                    ),
                });
            }
            ecowatch_config::save_config_to(&Config::example(), &path)?;
            tracing::info!(path = %path.display(), "config written");
            output::print_notice(
                &output::status_line(
                    &format!(
                        "Configuration written to {}\nEdit the profile's base_url, then try: ecowatch grid stations",
                        path.display()
                    ),
                    color,
                ),
                global.quiet,
            );
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(format, &cfg, to_toml)?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            let paths = Paths {
                config: config::effective_config_path(global).display().to_string(),
                state: config::effective_state_path(global).display().to_string(),
            };
            let out = output::render_single(format, &paths, |p| {
                format!("config: {}\nstate:  {}", p.config, p.state)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
