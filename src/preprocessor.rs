use crate::api::*;
use std::collections::{HashMap, HashSet};

/// One level of the conditional stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfState {
    /// Code in the current arm is kept; `#else` flips to Drop.
    Keep,
    /// The current arm is dropped, but a later `#elif`/`#else` may still
    /// turn the construct on.
    ElseKeep,
    /// Every remaining arm of this construct is dropped.
    Drop,
}

/// Run the preprocessor over an already-lexed token list. `defines` maps
/// macro names to replacement text and is installed before the pass begins,
/// as if each entry were a `#define`; malformed entries are ignored the same
/// way malformed `#define` lines are.
///
/// The only errors that propagate are fatal expansion faults (`InvalidHash`,
/// `InvalidPaste`); no partial output is returned for those.
pub fn preprocess(
    raw: &TokenList,
    defines: &HashMap<String, String>,
) -> Result<TokenList, Error> {
    let mut macros = MacroTable::new();
    for (name, value) in defines {
        if let Ok(mac) = Macro::from_value(name, value) {
            macros.insert(mac.name().to_string(), mac);
        }
    }

    let toks = raw.to_vec();
    let mut ifstates = vec![IfState::Keep];
    let mut output = TokenList::new();

    let mut i = 0;
    while i < toks.len() {
        let tok = &toks[i];
        let top = ifstates.last().copied().unwrap_or(IfState::Keep);

        let line_start = i == 0 || toks[i - 1].loc.line != tok.loc.line;
        if tok.op() == b'#' && line_start {
            let keyword = match toks.get(i + 1) {
                Some(keyword) => keyword,
                None => break,
            };

            if !keyword.is_name() {
                // Not a directive after all; whatever follows the `#` gets
                // reprocessed as ordinary content.
                i += 1;
                continue;
            }

            match keyword.text.as_str() {
                "define" => {
                    if top == IfState::Keep {
                        if let Ok(mac) = Macro::parse(&toks, i) {
                            macros.insert(mac.name().to_string(), mac);
                        }
                    }
                }

                "if" | "ifdef" | "ifndef" | "elif" => {
                    let cond = if top == IfState::Drop {
                        false
                    } else if keyword.text == "ifdef" {
                        toks.get(i + 2)
                            .map_or(false, |t| macros.contains_key(&t.text))
                    } else if keyword.text == "ifndef" {
                        !toks
                            .get(i + 2)
                            .map_or(false, |t| macros.contains_key(&t.text))
                    } else {
                        let expr = build_condition(&toks, i + 1, &macros)?;
                        crate::expr::evaluate(expr) != 0
                    };

                    if keyword.text != "elif" {
                        if top != IfState::Keep {
                            ifstates.push(IfState::Drop);
                        } else if cond {
                            ifstates.push(IfState::Keep);
                        } else {
                            ifstates.push(IfState::ElseKeep);
                        }
                    } else if top == IfState::Keep {
                        // The taken arm ends here; everything after it in
                        // this construct, `#else` included, is inert.
                        if let Some(top) = ifstates.last_mut() {
                            *top = IfState::Drop;
                        }
                    } else if top == IfState::ElseKeep && cond {
                        if let Some(top) = ifstates.last_mut() {
                            *top = IfState::Keep;
                        }
                    }
                }

                "else" => {
                    if let Some(top) = ifstates.last_mut() {
                        *top = match *top {
                            IfState::ElseKeep => IfState::Keep,
                            _ => IfState::Drop,
                        };
                    }
                }

                "endif" => {
                    // The bottom sentinel never pops; an unbalanced #endif is
                    // silently ignored.
                    if ifstates.len() > 1 {
                        ifstates.pop();
                    }
                }

                // Unrecognized directives are dropped with their line.
                _ => {}
            }

            i = goto_next_line(&toks, i + 1);
            continue;
        }

        if top != IfState::Keep {
            i = goto_next_line(&toks, i);
            continue;
        }

        if tok.is_name() {
            if let Some(mac) = macros.get(&tok.text) {
                let active = HashSet::new();
                i = mac.expand(&mut output, tok.loc, &toks, i, &macros, &active)?;
                continue;
            }
        }

        output.push_back(tok.clone());
        i += 1;
    }

    return Ok(output);
}

/// Build the token list a `#if`/`#elif` condition evaluates: `defined X` and
/// `defined ( X )` become `1`/`0` without expanding `X`, remaining macros are
/// expanded, and everything else is copied with the condition's location.
fn build_condition(
    toks: &[Token],
    keyword_idx: usize,
    macros: &MacroTable,
) -> Result<TokenList, Error> {
    let end = goto_next_line(toks, keyword_idx);
    let mut expr = TokenList::new();

    let mut j = keyword_idx + 1;
    while j < end {
        let t = &toks[j];

        if !t.is_name() {
            expr.push_back(Token::new(t.text.clone(), t.loc));
            j += 1;
            continue;
        }

        if t.text == "defined" {
            j += 1;
            if j >= end {
                break;
            }

            let par = toks[j].op() == b'(';
            if par {
                j += 1;
            }
            if j >= end {
                break;
            }

            let value = if macros.contains_key(&toks[j].text) {
                "1"
            } else {
                "0"
            };
            expr.push_back(Token::new(value, toks[j].loc));

            j += 1;
            if par && j < end {
                j += 1;
            }
            continue;
        }

        if let Some(mac) = macros.get(&t.text) {
            let mut value = TokenList::new();
            let active = HashSet::new();
            let next = mac.expand(&mut value, t.loc, toks, j, macros, &active)?;

            for expanded in value.iter() {
                expr.push_back(Token::new(expanded.text.clone(), t.loc));
            }

            j = next;
            continue;
        }

        expr.push_back(Token::new(t.text.clone(), t.loc));
        j += 1;
    }

    return Ok(expr);
}

/// Index of the first token on a later line than `toks[i]`.
fn goto_next_line(toks: &[Token], i: usize) -> usize {
    let line = toks[i].loc.line;

    let mut j = i;
    while j < toks.len() && toks[j].loc.line == line {
        j += 1;
    }

    return j;
}
