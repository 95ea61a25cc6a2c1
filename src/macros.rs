use crate::api::*;
use std::collections::{HashMap, HashSet};

/// Macro name -> definition. Redefinition overwrites; there is no `#undef`.
pub type MacroTable = HashMap<String, Macro>;

#[derive(Debug, Clone)]
pub enum MacroKind {
    /// Object-like macro: no parameter list at all.
    Value { body: Vec<Token> },

    /// Function-like macro: `(` hugs the name in the definition. Zero
    /// parameters is a distinct shape from object-like.
    Func { params: Vec<String>, body: Vec<Token> },
}

/// A parsed `#define`. The body is an owned copy of the replacement tokens,
/// which all sit on the definition line.
#[derive(Debug, Clone)]
pub struct Macro {
    name: String,
    loc: CodeLoc,
    kind: MacroKind,
}

impl Macro {
    /// Parse a `#define` directive starting at the `#` token, which must be
    /// the first token on its line.
    pub fn parse(toks: &[Token], hash: usize) -> Result<Macro, Error> {
        let hash_tok = &toks[hash];
        let loc = hash_tok.loc;

        if hash > 0 && toks[hash - 1].loc.line == hash_tok.loc.line {
            throw!(BadDefine { loc });
        }
        if hash_tok.op() != b'#' {
            throw!(BadDefine { loc });
        }

        // The whole directive is a run of same-line tokens.
        match toks.get(hash + 1) {
            Some(t) if t.text == "define" && t.loc.line == loc.line => {}
            _ => throw!(BadDefine { loc }),
        }

        match toks.get(hash + 2) {
            Some(t) if t.is_name() && t.loc.line == loc.line => {}
            _ => throw!(BadDefine { loc }),
        }

        return Self::parse_at_name(toks, hash + 2);
    }

    /// Build a macro from an externally supplied definition, as if it came
    /// from `#define name value`. An empty value means `1`, so presence-only
    /// predefines work with `#if`/`defined`. A name like `F(x)` produces a
    /// function-like macro.
    pub fn from_value(name: &str, value: &str) -> Result<Macro, Error> {
        let value = if value.is_empty() { "1" } else { value };
        let def = format!("{} {}", name, value);

        let toks = crate::lexer::lex(&def, 0).to_vec();
        match toks.first() {
            Some(t) if t.is_name() => {}
            _ => throw!(BadDefine { loc: l(0, 1, 0) }),
        }

        return Self::parse_at_name(&toks, 0);
    }

    fn parse_at_name(toks: &[Token], name_idx: usize) -> Result<Macro, Error> {
        let name_tok = &toks[name_idx];
        let name = name_tok.text.clone();
        let loc = name_tok.loc;

        // Function-like iff the next token is a `(` with no gap after the
        // name. `#define F (x)` is an object-like macro with body `(x)`.
        let is_func = match toks.get(name_idx + 1) {
            Some(t) => {
                t.op() == b'('
                    && t.loc.line == name_tok.loc.line
                    && t.loc.col == name_tok.loc.col + name_tok.text.len() as u32
            }
            None => false,
        };

        let kind;
        let body_start;
        if is_func {
            let mut params = Vec::new();
            let mut i = name_idx + 2;
            loop {
                let t = match toks.get(i) {
                    Some(t) if t.loc.line == name_tok.loc.line => t,
                    _ => throw!(BadDefine { loc }),
                };

                if t.op() == b')' {
                    break;
                }
                if t.op() != b',' {
                    if !t.is_name() {
                        throw!(BadDefine { loc });
                    }
                    params.push(t.text.clone());
                }

                i += 1;
            }

            body_start = i + 1;
            kind = MacroKind::Func {
                params,
                body: Vec::new(),
            };
        } else {
            body_start = name_idx + 1;
            kind = MacroKind::Value { body: Vec::new() };
        }

        // The replacement list is whatever remains on the definition line.
        let mut body = Vec::new();
        let mut i = body_start;
        while i < toks.len() && toks[i].loc.line == name_tok.loc.line {
            body.push(toks[i].clone());
            i += 1;
        }

        let kind = match kind {
            MacroKind::Value { .. } => MacroKind::Value { body },
            MacroKind::Func { params, .. } => MacroKind::Func { params, body },
        };

        return Ok(Macro { name, loc, kind });
    }

    pub fn name(&self) -> &str {
        return &self.name;
    }

    pub fn is_function_like(&self) -> bool {
        return matches!(self.kind, MacroKind::Func { .. });
    }

    /// Expand one invocation of this macro found at `toks[name_idx]`,
    /// appending the replacement to `output`. Returns the index just past the
    /// consumed invocation.
    ///
    /// `active` is the caller's set of in-progress expansions; a fresh inner
    /// set with this macro's name added gates lookups inside the body, so a
    /// macro never re-enters its own expansion. Every recursive call inserts
    /// a name that was absent from the set it received, which bounds the
    /// recursion depth by the size of the macro table.
    pub fn expand(
        &self,
        output: &mut TokenList,
        loc: CodeLoc,
        toks: &[Token],
        name_idx: usize,
        macros: &MacroTable,
        active: &HashSet<String>,
    ) -> Result<usize, Error> {
        let mut active_inner = active.clone();
        active_inner.insert(self.name.clone());

        match &self.kind {
            MacroKind::Value { body } => {
                return self.expand_value(output, loc, body, name_idx, macros, active, &active_inner)
            }
            MacroKind::Func { params, body } => {
                return self.expand_func(
                    output,
                    loc,
                    params,
                    body,
                    toks,
                    name_idx,
                    macros,
                    active,
                    &active_inner,
                )
            }
        }
    }

    fn expand_value(
        &self,
        output: &mut TokenList,
        loc: CodeLoc,
        body: &[Token],
        name_idx: usize,
        macros: &MacroTable,
        active: &HashSet<String>,
        active_inner: &HashSet<String>,
    ) -> Result<usize, Error> {
        let mark = output.last();

        let mut i = 0;
        while i < body.len() {
            let t = &body[i];

            if t.is_name() && !active_inner.contains(&t.text) {
                if let Some(m) = macros.get(&t.text) {
                    i = m.expand(output, loc, body, i, macros, active_inner)?;
                    continue;
                }
            }

            output.push_back(self.macro_token(&t.text, loc));
            i += 1;
        }

        self.relabel(output, mark, active);
        return Ok(name_idx + 1);
    }

    fn expand_func(
        &self,
        output: &mut TokenList,
        loc: CodeLoc,
        params: &[String],
        body: &[Token],
        toks: &[Token],
        name_idx: usize,
        macros: &MacroTable,
        active: &HashSet<String>,
        active_inner: &HashSet<String>,
    ) -> Result<usize, Error> {
        // Delimiters of the invocation's argument ranges: the opening paren,
        // every top-level comma, and the closing paren. `F()` presents one
        // empty argument, so a zero-parameter macro is never matched.
        let argmarks = match get_macro_parameters(toks, name_idx) {
            Some(marks) if marks.len() == params.len() + 1 => marks,
            _ => {
                // Wrong shape or wrong arity: refuse the expansion and emit
                // the bare name, consuming only the name token.
                output.push_back(self.macro_token(&toks[name_idx].text, loc));
                return Ok(name_idx + 1);
            }
        };

        let entry_mark = output.last();

        let mut i = 0;
        while i < body.len() {
            if body[i].op() != b'#' {
                i = self.expand_token(
                    output,
                    loc,
                    body,
                    i,
                    toks,
                    &argmarks,
                    params,
                    macros,
                    active,
                    active_inner,
                )?;
                continue;
            }

            // `#`: either stringification, or the first half of `##`.
            i += 1;
            let next = match body.get(i) {
                Some(next) => next,
                None => throw!(InvalidHash { loc }),
            };

            if next.op() == b'#' {
                // A ## B: append the first token of B's expansion to the
                // previously emitted token, left-associatively.
                let a = match output.last() {
                    Some(a) if entry_mark != Some(a) => a,
                    _ => throw!(InvalidPaste { loc }),
                };

                i += 1;
                if i >= body.len() {
                    throw!(InvalidPaste { loc });
                }
                i = self.expand_token(
                    output,
                    loc,
                    body,
                    i,
                    toks,
                    &argmarks,
                    params,
                    macros,
                    active,
                    active_inner,
                )?;

                let b = match output.next(a) {
                    Some(b) => b,
                    None => throw!(InvalidPaste { loc }),
                };
                let b_text = output.get(b).text.clone();
                output.get_mut(a).text.push_str(&b_text);
                output.delete(b);
            } else {
                // #param: the fully expanded argument becomes one quoted
                // string token, lexemes concatenated without separators.
                let par = match params.iter().position(|p| p == &next.text) {
                    Some(par) if next.is_name() => par,
                    _ => throw!(InvalidHash { loc }),
                };

                let mut scratch = TokenList::new();
                self.expand_arg(
                    &mut scratch,
                    loc,
                    toks,
                    &argmarks,
                    par,
                    macros,
                    active,
                    active_inner,
                )?;

                let mut text = String::from("\"");
                for tok in scratch.iter() {
                    text.push_str(&tok.text);
                }
                text.push('"');

                let mut tok = Token::new(text, loc);
                if !active.is_empty() {
                    tok.macro_name = Some(self.name.clone());
                }
                output.push_back(tok);
                i += 1;
            }
        }

        return Ok(argmarks[argmarks.len() - 1] + 1);
    }

    /// Expand one non-`#` body token of a function-like macro.
    fn expand_token(
        &self,
        output: &mut TokenList,
        loc: CodeLoc,
        body: &[Token],
        i: usize,
        invocation: &[Token],
        argmarks: &[usize],
        params: &[String],
        macros: &MacroTable,
        active: &HashSet<String>,
        active_inner: &HashSet<String>,
    ) -> Result<usize, Error> {
        let t = &body[i];

        if !t.is_name() {
            output.push_back(self.macro_token(&t.text, loc));
            return Ok(i + 1);
        }

        if let Some(par) = params.iter().position(|p| p == &t.text) {
            self.expand_arg(output, loc, invocation, argmarks, par, macros, active, active_inner)?;
            return Ok(i + 1);
        }

        // Plain body name: same lookup discipline as object-like bodies.
        if !active_inner.contains(&t.text) {
            if let Some(m) = macros.get(&t.text) {
                return m.expand(output, loc, body, i, macros, active_inner);
            }
        }

        output.push_back(self.macro_token(&t.text, loc));
        return Ok(i + 1);
    }

    /// Substitute one argument range. Macros named by argument tokens are
    /// expanded in the caller's context: the gate is the *outer* active set,
    /// not the one that includes this macro.
    fn expand_arg(
        &self,
        output: &mut TokenList,
        loc: CodeLoc,
        invocation: &[Token],
        argmarks: &[usize],
        par: usize,
        macros: &MacroTable,
        active: &HashSet<String>,
        active_inner: &HashSet<String>,
    ) -> Result<(), Error> {
        let mut j = argmarks[par] + 1;
        let end = argmarks[par + 1];

        while j < end {
            let at = &invocation[j];

            if at.is_name() && !active.contains(&at.text) {
                if let Some(m) = macros.get(&at.text) {
                    j = m.expand(output, loc, invocation, j, macros, active_inner)?;
                    continue;
                }
            }

            // At the outermost level the argument came from raw source, and
            // it keeps that status; inside a nested expansion it is
            // attributed like any other produced token.
            let mut tok = Token::new(at.text.clone(), loc);
            if !active.is_empty() {
                tok.macro_name = Some(self.name.clone());
            }
            output.push_back(tok);
            j += 1;
        }

        return Ok(());
    }

    fn macro_token(&self, text: &str, loc: CodeLoc) -> Token {
        let mut tok = Token::new(text, loc);
        tok.macro_name = Some(self.name.clone());
        return tok;
    }

    /// The observable attribution of an expansion is the user-visible macro:
    /// once the outermost call finishes, every token it produced that carries
    /// some attribution is re-attributed to that macro.
    fn relabel(&self, output: &mut TokenList, mark: Option<TokenId>, active: &HashSet<String>) {
        if !active.is_empty() {
            return;
        }

        let mut cur = match mark {
            Some(id) => output.next(id),
            None => output.first(),
        };

        while let Some(id) = cur {
            if output.get(id).macro_name.is_some() {
                output.get_mut(id).macro_name = Some(self.name.clone());
            }
            cur = output.next(id);
        }
    }
}

/// Find the delimiters of a function-like invocation starting after the name:
/// the index of `(`, of every top-level `,`, and of the matching `)`. Returns
/// `None` when the name isn't followed by `(` or the parens never close.
fn get_macro_parameters(toks: &[Token], name_idx: usize) -> Option<Vec<usize>> {
    let open = name_idx + 1;
    match toks.get(open) {
        Some(t) if t.op() == b'(' => {}
        _ => return None,
    }

    let mut marks = vec![open];
    let mut depth = 0u32;

    let mut i = open + 1;
    while i < toks.len() {
        let op = toks[i].op();

        if op == b'(' {
            depth += 1;
        } else if op == b')' {
            if depth == 0 {
                marks.push(i);
                return Some(marks);
            }
            depth -= 1;
        } else if op == b',' && depth == 0 {
            marks.push(i);
        }

        i += 1;
    }

    return None;
}
