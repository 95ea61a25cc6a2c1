#![allow(dead_code)]
#![allow(unused_variables)]

#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod error;

pub mod expr;
pub mod filedb;
pub mod lexer;
pub mod macros;
pub mod preprocessor;
pub mod token;

#[cfg(test)]
mod tests;

pub mod api {
    pub use super::error::{Error, ErrorKind};
    pub use super::expr::evaluate;
    pub use super::filedb::{File, FileDb};
    pub use super::lexer::{combine_operators, is_ident_char, lex};
    pub use super::macros::{Macro, MacroKind, MacroTable};
    pub use super::preprocessor::preprocess;
    pub use super::token::{l, CodeLoc, Token, TokenId, TokenList};

    pub use super::{
        parse_test_case, run_preprocessor_for_testing, run_preprocessor_test_case, PipelineData,
        StageOutput,
    };

    pub(crate) use serde::{Deserialize, Serialize};
    pub(crate) use std::collections::HashMap;

    #[cfg(test)]
    pub use ntest::*;
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum StageOutput<T> {
    Ok(Vec<T>),
    Err(crate::error::ErrorKind),
    Ignore,
}

impl<T> Default for StageOutput<T> {
    fn default() -> Self {
        Self::Ignore
    }
}

impl<T> PartialEq<StageOutput<T>> for StageOutput<T>
where
    T: PartialEq<T>,
{
    fn eq(&self, other: &StageOutput<T>) -> bool {
        match (self, other) {
            // If there's no stage, dw about it
            (Self::Ignore, _) => return true,
            (_, Self::Ignore) => return true,

            (Self::Ok(s), Self::Ok(o)) => return s == o,
            (Self::Err(s), Self::Err(o)) => return s == o,

            _ => return false,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
pub struct PipelineData {
    #[serde(default)]
    pub lexer: StageOutput<String>,

    #[serde(default)]
    pub preprocessor: StageOutput<String>,
}

const TEST_CASE_DELIMITER: &'static str = "// -- END TEST CASE --\n// ";

/// Run a source buffer through lexing and preprocessing (no predefines) and
/// snapshot each stage as its ordered lexemes.
pub fn run_preprocessor_for_testing(source: String) -> PipelineData {
    use crate::api::*;

    let mut files = FileDb::new();
    let file_id = files
        .add_file("main.c".to_string(), source)
        .expect("file should add properly");
    let file = &files.files[file_id as usize];

    let mut out = PipelineData {
        lexer: StageOutput::Err(ErrorKind::DidntRun),
        preprocessor: StageOutput::Err(ErrorKind::DidntRun),
    };

    let tokens = lex(&file.source, file.id);
    out.lexer = StageOutput::Ok(tokens.iter().map(|t| t.text.clone()).collect());

    let defines = HashMap::new();
    match preprocess(&tokens, &defines) {
        Ok(res) => {
            out.preprocessor = StageOutput::Ok(res.iter().map(|t| t.text.clone()).collect())
        }
        Err(e) => out.preprocessor = StageOutput::Err(e.kind),
    }

    return out;
}

/// Split a test case into its source and the expected pipeline output
/// embedded after the delimiter comment. A case without expectations
/// compares equal to everything.
pub fn parse_test_case(test_source: &str) -> (&str, PipelineData) {
    let (source, expected_str) = test_source
        .split_once(TEST_CASE_DELIMITER)
        .unwrap_or((test_source, "null"));

    let expected = serde_json::from_str::<Option<PipelineData>>(expected_str)
        .expect("Test case expected value didn't parse")
        .unwrap_or(PipelineData {
            lexer: StageOutput::Ignore,
            preprocessor: StageOutput::Ignore,
        });

    return (source, expected);
}

pub fn run_preprocessor_test_case(test_source: &str) -> (&str, PipelineData) {
    let (source, expected) = parse_test_case(test_source);

    let mut source_string = source.to_string();
    if !source_string.ends_with("\n") {
        source_string.push('\n');
    }

    let output = run_preprocessor_for_testing(source_string);
    assert_eq!(output, expected);

    return (source, output);
}

impl PipelineData {
    pub fn test_case(&self, source: &str) -> String {
        let mut output = source.to_string();

        let text = serde_json::to_string(self).expect("failed to serialize test output");

        if !output.ends_with("\n") {
            output.push('\n');
        }

        output.push_str(TEST_CASE_DELIMITER);
        output.push_str(&text);
        output.push('\n');

        return output;
    }
}
