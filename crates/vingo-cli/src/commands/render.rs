// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Implementation of the `vingo render` command.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, WrapErr};
use vingo_engine::{Context, Error, Value};

use crate::diagnostic;

#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    /// Template file to render
    pub template: PathBuf,

    /// JSON file whose top-level object becomes the render context
    #[arg(long, env = "VINGO_DATA")]
    pub data: Option<PathBuf>,

    /// Set a context variable; the value is parsed as JSON, falling back to a plain string
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, serde_json::Value)>,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run_render(args: RenderArgs) -> miette::Result<i32> {
    let context = match build_context(args.data.as_deref(), args.set) {
        Ok(context) => context,
        Err(report) => {
            eprintln!("{report:?}");
            return Ok(exitcode::DATAERR);
        }
    };

    let rendered = match vingo_engine::render_file(&args.template, &context) {
        Ok(rendered) => rendered,
        Err(err) => {
            let code = match err {
                Error::Io { .. } => exitcode::NOINPUT,
                _ => exitcode::DATAERR,
            };
            eprintln!("{:?}", diagnostic::report(&args.template, &err));
            return Ok(code);
        }
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot write {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .into_diagnostic()?,
    }
    Ok(exitcode::OK)
}

/// Loads `--data` and applies `--set` overrides on top of it.
fn build_context(
    data: Option<&Path>,
    overrides: Vec<(String, serde_json::Value)>,
) -> miette::Result<Context> {
    let mut context = match data {
        Some(path) => {
            let text = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("cannot read data file {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid JSON in {}", path.display()))?;
            Context::from_serialize(&json)
                .into_diagnostic()
                .wrap_err_with(|| format!("unusable data in {}", path.display()))?
        }
        None => Context::new(),
    };
    for (key, value) in overrides {
        tracing::debug!(key = key.as_str(), "context override");
        context.insert(key, Value::from(value));
    }
    Ok(context)
}

fn parse_assignment(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignments_parse_json_or_fall_back_to_text() {
        assert_eq!(
            parse_assignment("count=3").unwrap(),
            ("count".to_string(), json!(3))
        );
        assert_eq!(
            parse_assignment("tags=[\"a\"]").unwrap(),
            ("tags".to_string(), json!(["a"]))
        );
        assert_eq!(
            parse_assignment("name=Ada Lovelace").unwrap(),
            ("name".to_string(), json!("Ada Lovelace"))
        );
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".to_string(), json!("a=b"))
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn overrides_replace_data_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        fs::write(&data, r#"{"name": "Ada", "admin": false}"#).unwrap();

        let context = build_context(
            Some(data.as_path()),
            vec![("admin".to_string(), json!(true))],
        )
        .unwrap();
        assert_eq!(context.get("name"), Some(&Value::from("Ada")));
        assert_eq!(context.get("admin"), Some(&Value::Bool(true)));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        fs::write(&data, "[1, 2]").unwrap();
        assert!(build_context(Some(data.as_path()), Vec::new()).is_err());
    }

    #[test]
    fn renders_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("hello.vgo");
        let output = dir.path().join("hello.html");
        fs::write(&template, "<p><{ greeting | \"hi\" }></p>").unwrap();

        let code = run_render(RenderArgs {
            template,
            data: None,
            set: vec![("greeting".to_string(), json!("hello"))],
            output: Some(output.clone()),
        })
        .unwrap();
        assert_eq!(code, exitcode::OK);
        assert_eq!(fs::read_to_string(output).unwrap(), "<p>hello</p>");
    }

    #[test]
    fn missing_template_exits_with_noinput() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_render(RenderArgs {
            template: dir.path().join("missing.vgo"),
            data: None,
            set: Vec::new(),
            output: None,
        })
        .unwrap();
        assert_eq!(code, exitcode::NOINPUT);
    }
}
