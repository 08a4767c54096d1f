//! A built declaration and the report of one parse.

use std::collections::BTreeMap;
use std::fmt;

use cmdline_core::{CmdLine, Handle, ParseError, ParseOutcome};
use serde::Serialize;
use serde_json::Value as Json;

/// Options registered from a [`Document`](crate::Document), ready to parse.
#[derive(Debug)]
pub struct Declaration {
    cmd: CmdLine,
    handles: Vec<Handle<Json>>,
}

impl Declaration {
    pub(crate) fn new(cmd: CmdLine, handles: Vec<Handle<Json>>) -> Self {
        Self { cmd, handles }
    }

    pub fn cmd(&self) -> &CmdLine {
        &self.cmd
    }

    /// Parses `args` without response-file expansion.
    pub fn parse<I, S>(&mut self, args: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outcome = self.cmd.parse(args);
        self.report(outcome)
    }

    /// Expands `@file` arguments (when enabled in the document's config) and
    /// parses the result.
    pub fn expand_and_parse<I, S>(&mut self, args: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outcome = self.cmd.expand_and_parse(args);
        self.report(outcome)
    }

    fn report(&self, outcome: ParseOutcome) -> ParseReport {
        let options = self
            .handles
            .iter()
            .filter_map(|handle| {
                let entry = self.cmd.entry(handle.id())?;
                let value = self.cmd.value(handle).cloned().unwrap_or(Json::Null);
                Some((
                    entry.display_name().to_string(),
                    OptionReport {
                        count: entry.count(),
                        value,
                    },
                ))
            })
            .collect();

        ParseReport {
            success: outcome.is_success(),
            errors: outcome.errors,
            unknowns: outcome.unknowns,
            options,
        }
    }
}

/// Count and final value of one option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionReport {
    pub count: u32,
    pub value: Json,
}

/// Serializable result of one parse.
///
/// Options are keyed by display name: the first alias, or the argument label
/// for options declared without a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    pub success: bool,
    pub errors: Vec<ParseError>,
    pub unknowns: Vec<String>,
    pub options: BTreeMap<String, OptionReport>,
}

/// Human-readable rendering: errors first, then every option that occurred.
impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.errors {
            writeln!(f, "error: {err}")?;
        }
        for token in &self.unknowns {
            writeln!(f, "unrecognized: {token}")?;
        }
        for (name, option) in self.options.iter().filter(|(_, o)| o.count > 0) {
            writeln!(f, "{name} ({}): {}", option.count, option.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Document;

    #[test]
    fn test_report_lists_every_option() {
        let doc = Document::from_yaml_str(
            "options:\n  - name: v|verbose\n    kind: bool\n  - name: o\n    arg: required\n",
        )
        .unwrap();
        let mut decl = doc.build().unwrap();

        let report = decl.parse(["-v"]);
        assert!(report.success);
        assert_eq!(report.options.len(), 2);
        assert_eq!(report.options["v"].count, 1);
        assert_eq!(report.options["v"].value, json!(true));
        assert_eq!(report.options["o"].count, 0);
        assert_eq!(report.options["o"].value, json!(null));
    }

    #[test]
    fn test_report_text_rendering() {
        let doc = Document::from_yaml_str(
            "options:\n  - name: n\n    kind: int\n    arg: required\n  - name: q\n",
        )
        .unwrap();
        let mut decl = doc.build().unwrap();

        let report = decl.parse(["-n", "7", "-x"]);
        assert!(!report.success);
        assert_eq!(report.to_string(), "error: unknown option '-x'\nn (1): 7\n");
    }

    #[test]
    fn test_report_serializes_error_kind() {
        let doc = Document::from_yaml_str("options:\n  - name: n\n    kind: int\n").unwrap();
        let mut decl = doc.build().unwrap();

        let report = decl.parse(["--n=x"]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["errors"][0]["kind"], json!("invalid_argument"));
        assert_eq!(value["errors"][0]["option"], json!("n"));
        assert_eq!(value["errors"][0]["value"], json!("x"));
    }
}
