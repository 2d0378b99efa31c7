//! `docgen render` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use docgen_config::Config;
use docgen_render::Document;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the markup file.
    input: PathBuf,

    /// Where to write the JSON display list (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markup file rendered once before the body.
    #[arg(long)]
    document_header: Option<PathBuf>,

    /// Markup file rendered at the top of every page after the first.
    #[arg(long)]
    page_header: Option<PathBuf>,

    /// Markup file rendered at the bottom of every page.
    #[arg(long)]
    page_footer: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading the inputs, rendering or
    /// writing the output fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let json = self.render()?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, json)?;
                Output::new().success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(json.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Load configuration and inputs, then render to JSON.
    fn render(&self) -> Result<String, CliError> {
        let config = Config::load(self.config.as_deref())?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let mut document = Document::new(config.resolve());
        if let Some(path) = &self.document_header {
            document = document.with_document_header(read_markup(path)?);
        }
        if let Some(path) = &self.page_header {
            document = document.with_page_header(read_markup(path)?);
        }
        if let Some(path) = &self.page_footer {
            document = document.with_page_footer(read_markup(path)?);
        }

        let markup = read_markup(&self.input)?;
        tracing::info!(input = %self.input.display(), "Rendering");
        Ok(document.render_to_json(&markup)?)
    }
}

fn read_markup(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
