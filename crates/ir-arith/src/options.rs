// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;

/// Defines options for a run of the simplifier.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about)]
pub struct Options {
    /// Keep `let` bindings as written instead of peeling and eliding them.
    #[arg(long = "keep-lets")]
    pub keep_lets: bool,
    /// Active experiments. Experiments alter default behavior of the simplifier.
    /// See `Experiment` struct.
    #[arg(long = "experiment", action = clap::ArgAction::Append)]
    pub experiments: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Parser::parse_from(std::iter::empty::<String>())
    }
}

impl Options {
    /// Whether let bindings may be peeled, substituted and dropped.
    pub fn simplify_lets(&self) -> bool {
        !self.keep_lets
    }

    /// Returns true if an experiment is on.
    pub fn experiment_on(&self, name: &str) -> bool {
        self.experiments.iter().any(|s| s == name)
    }
}

/// Names of the known experiments.
pub struct Experiment;

impl Experiment {
    /// Log every rule firing at `debug!` instead of `trace!`.
    pub const TRACE_RULES: &'static str = "trace-rules";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(options.simplify_lets());
        assert!(!options.experiment_on(Experiment::TRACE_RULES));
    }

    #[test]
    fn test_parse_options() {
        let options = Options::parse_from([
            "simplify",
            "--keep-lets",
            "--experiment",
            "trace-rules",
        ]);
        assert!(!options.simplify_lets());
        assert!(options.experiment_on(Experiment::TRACE_RULES));
    }
}
