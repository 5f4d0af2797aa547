// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Implementation of the `vingo init` command.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use miette::{IntoDiagnostic, WrapErr};
use serde_json::json;

#[derive(Debug, clap::Args)]
pub struct InitArgs {
    /// Project directory to write settings into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Which settings file to generate
    #[arg(long, value_enum, default_value_t = Layout::Vscode)]
    pub layout: Layout,

    /// Overwrite an existing settings file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// `.vscode/settings.json` mapping `*.vgo` to HTML
    Vscode,
    /// `settings.json` with `fileAssociations` for `.vgo` and `.vingo`
    Standalone,
}

impl Layout {
    fn relative_path(self) -> &'static Path {
        match self {
            Layout::Vscode => Path::new(".vscode/settings.json"),
            Layout::Standalone => Path::new("settings.json"),
        }
    }

    fn contents(self) -> serde_json::Value {
        match self {
            Layout::Vscode => json!({
                "files.associations": {
                    "*.vgo": "html"
                }
            }),
            Layout::Standalone => json!({
                "fileAssociations": [
                    { "extension": ".vgo", "icon": "html", "syntax": "html" },
                    { "extension": ".vingo", "icon": "html", "syntax": "html" }
                ]
            }),
        }
    }
}

pub fn run_init(args: &InitArgs) -> miette::Result<i32> {
    let path = args.dir.join(args.layout.relative_path());
    if path.exists() && !args.force {
        eprintln!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
        return Ok(exitcode::CANTCREAT);
    }
    write_settings(&path, &args.layout.contents())?;
    println!("wrote {}", path.display());
    Ok(exitcode::OK)
}

fn write_settings(path: &Path, contents: &serde_json::Value) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot create {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(contents).into_diagnostic()?;
    text.push('\n');
    fs::write(path, text)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot write {}", path.display()))
}
