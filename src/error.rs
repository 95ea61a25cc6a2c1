use crate::token::CodeLoc;
use codespan_reporting::diagnostic::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    DidntRun,

    // Recoverable: the driver drops the directive and moves on.
    BadDefine { loc: CodeLoc },

    // Fatal for the expansion that produced them.
    InvalidHash { loc: CodeLoc },
    InvalidPaste { loc: CodeLoc },
}

macro_rules! error {
    ($e:ident) => {
        Error::new(crate::error::ErrorKind::$e)
    };
    ($e:ident $t:tt) => {
        Error::new(crate::error::ErrorKind::$e $t)
    };
}

macro_rules! throw {
    ($e:ident) => {
        return Err(Error::new(crate::error::ErrorKind::$e))
    };
    ($e:ident $t:tt) => {
        return Err(Error::new(crate::error::ErrorKind::$e $t))
    };
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,

    pub backtrace: Option<std::backtrace::Backtrace>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        return Error {
            kind,

            #[cfg(debug_assertions)]
            backtrace: Some(std::backtrace::Backtrace::capture()),

            #[cfg(not(debug_assertions))]
            backtrace: None,
        };
    }

    pub fn message(&self) -> String {
        use ErrorKind::*;

        match &self.kind {
            DidntRun => format!("preprocessor phase didn't run"),

            BadDefine { .. } => format!("bad macro syntax in #define"),

            InvalidHash { .. } => {
                format!("'#' in a macro body must be followed by a parameter name")
            }
            InvalidPaste { .. } => format!("'##' has no token to paste on one of its sides"),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic<u32> {
        use ErrorKind::*;

        let diagnostic = Diagnostic::error().with_message(self.message());

        let loc = match &self.kind {
            DidntRun => return diagnostic,
            BadDefine { loc } => loc,
            InvalidHash { loc } => loc,
            InvalidPaste { loc } => loc,
        };

        return diagnostic.with_notes(vec![format!(
            "in file {} at {}:{}",
            loc.file, loc.line, loc.col
        )]);
    }
}
