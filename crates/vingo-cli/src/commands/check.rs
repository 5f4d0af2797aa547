// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Implementation of the `vingo check` command.

use std::path::PathBuf;

use vingo_engine::{Error, Template};

use crate::diagnostic;

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Template files to compile
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only report failures
    #[arg(short, long)]
    pub quiet: bool,
}

/// Compiles every file and reports each failure. Unreadable files take
/// precedence over parse errors in the exit code.
pub fn run_check(args: &CheckArgs) -> miette::Result<i32> {
    let mut code = exitcode::OK;
    for path in &args.files {
        match Template::from_file(path) {
            Ok(template) => {
                if !args.quiet {
                    println!("{}: ok ({} nodes)", path.display(), template.nodes().len());
                }
            }
            Err(err) => {
                eprintln!("{:?}", diagnostic::report(path, &err));
                code = match err {
                    Error::Io { .. } => exitcode::NOINPUT,
                    _ if code == exitcode::NOINPUT => code,
                    _ => exitcode::DATAERR,
                };
            }
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn check(files: Vec<PathBuf>) -> i32 {
        run_check(&CheckArgs { files, quiet: true }).unwrap()
    }

    #[test]
    fn valid_templates_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.vgo");
        fs::write(&path, "<{for v in items}><{v}><{/for}>").unwrap();
        assert_eq!(check(vec![path]), exitcode::OK);
    }

    #[test]
    fn parse_errors_exit_with_dataerr() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.vgo");
        let bad = dir.path().join("bad.vgo");
        fs::write(&good, "fine").unwrap();
        fs::write(&bad, "<{switch x}><{case 1}>").unwrap();
        assert_eq!(check(vec![good, bad]), exitcode::DATAERR);
    }

    #[test]
    fn missing_files_exit_with_noinput() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.vgo");
        fs::write(&bad, "<{/if}>").unwrap();
        assert_eq!(
            check(vec![dir.path().join("missing.vgo"), bad]),
            exitcode::NOINPUT
        );
    }
}
