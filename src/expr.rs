use crate::api::*;
use std::collections::HashMap;

lazy_static! {
    /// Byte sizes reported for `sizeof` on the primitive types the evaluator
    /// recognizes (LP64 sizes).
    static ref PRIMITIVE_SIZES: HashMap<&'static str, i64> = {
        let mut set = HashMap::new();
        set.insert("char", 1);
        set.insert("short", 2);
        set.insert("int", 4);
        set.insert("long", 8);
        set.insert("float", 4);
        set.insert("double", 8);

        set
    };
}

/// Evaluate a `#if`/`#elif` condition. The list must already have `defined`
/// substituted and macros expanded; this runs the `sizeof`/name/number
/// rewrites and then constant folding. An empty or unparseable result
/// evaluates to 0. Never panics: overflow wraps, division by zero folds to 0.
pub fn evaluate(mut expr: TokenList) -> i64 {
    simplify_sizeof(&mut expr);
    simplify_names(&mut expr);
    simplify_numbers(&mut expr);
    const_fold(&mut expr);

    match expr.first() {
        Some(id) => parse_i64(&expr.get(id).text),
        None => 0,
    }
}

/// Replace each `sizeof` and its operand (a parenthesized type list or the
/// single following token) with the size of the last recognized primitive in
/// the operand; unrecognized operands yield 0.
fn simplify_sizeof(expr: &mut TokenList) {
    let mut cur = expr.first();

    while let Some(id) = cur {
        if expr.get(id).text != "sizeof" {
            cur = expr.next(id);
            continue;
        }

        let t1 = match expr.next(id) {
            Some(t1) => t1,
            None => break,
        };

        // Exclusive end of the operand range.
        let mut t2 = expr.next(t1);
        if expr.get(t1).op() == b'(' {
            let mut scan = t2;
            loop {
                match scan {
                    Some(s) if expr.get(s).op() != b')' => scan = expr.next(s),
                    Some(s) => {
                        t2 = expr.next(s);
                        break;
                    }
                    None => {
                        t2 = None;
                        break;
                    }
                }
            }
        }

        let mut sz: i64 = 0;
        let mut t = Some(t1);
        while t != t2 {
            let tid = match t {
                Some(tid) => tid,
                None => break,
            };
            if let Some(&size) = PRIMITIVE_SIZES.get(expr.get(tid).text.as_str()) {
                sz = size;
            }
            t = expr.next(tid);
        }

        expr.get_mut(id).text = sz.to_string();

        while expr.next(id) != t2 {
            match expr.next(id) {
                Some(n) => expr.delete(n),
                None => break,
            }
        }

        cur = expr.next(id);
    }
}

/// Remaining identifiers are undefined macros; C evaluates them as 0.
fn simplify_names(expr: &mut TokenList) {
    let mut cur = expr.first();

    while let Some(id) = cur {
        if expr.get(id).is_name() {
            expr.get_mut(id).text = "0".to_string();
        }
        cur = expr.next(id);
    }
}

/// Normalize numeric spellings: `0x` literals are rewritten in decimal, and a
/// character literal becomes the value of its second character.
fn simplify_numbers(expr: &mut TokenList) {
    let mut cur = expr.first();

    while let Some(id) = cur {
        let text = &expr.get(id).text;

        if text.len() > 1 {
            if let Some(hex) = text.strip_prefix("0x") {
                let value = i64::from_str_radix(hex, 16).unwrap_or(0);
                expr.get_mut(id).text = value.to_string();
            } else if text.as_bytes()[0] == b'\'' {
                let value = text.as_bytes()[1] as i64;
                expr.get_mut(id).text = value.to_string();
            }
        }

        cur = expr.next(id);
    }
}

/// Iterative constant folding: fold the innermost (last-opened) parenthesized
/// range with the operator passes in precedence order, strip the parens, and
/// repeat until no range is left to collapse.
fn const_fold(expr: &mut TokenList) {
    while expr.first().is_some() {
        // goto last '('. The paren handle stays valid through the passes
        // (folding only ever deletes number tokens and `!` operands), but
        // with no paren the passes may delete the list head, so each pass
        // re-derives its own start instead of sharing one handle.
        let mut open = expr.last();
        while let Some(id) = open {
            if expr.get(id).op() == b'(' {
                break;
            }
            open = expr.prev(id);
        }

        const_fold_not(expr, open);
        const_fold_mul_div_rem(expr, open);
        const_fold_add_sub(expr, open);
        const_fold_comparison(expr, open);
        const_fold_logical(expr, open);

        // If there was no '(' we folded the whole list and we're done.
        let start = match open {
            Some(start) => start,
            None => break,
        };

        // "( x )" collapses to "x"; anything else left inside means the
        // range didn't fold to a single token, and we're done.
        let inner = match expr.next(start) {
            Some(inner) => inner,
            None => break,
        };
        let close = match expr.next(inner) {
            Some(close) => close,
            None => break,
        };
        if expr.get(close).op() != b')' {
            break;
        }

        expr.delete(start);
        expr.delete(close);
    }
}

fn const_fold_not(expr: &mut TokenList, open: Option<TokenId>) {
    let mut cur = open.or_else(|| expr.first());

    while let Some(id) = cur {
        if expr.get(id).op() == b')' {
            break;
        }

        if expr.get(id).op() == b'!' {
            if let Some(next) = expr.next(id) {
                if expr.get(next).is_number() {
                    let value = if expr.get(next).text == "0" { "1" } else { "0" };
                    expr.get_mut(id).text = value.to_string();
                    expr.delete(next);
                }
            }
        }

        cur = expr.next(id);
    }
}

/// Collapse one `number OP number` triple at `id`, if it is one.
fn fold_binary_at(expr: &mut TokenList, id: TokenId, apply: impl Fn(&str, i64, i64) -> Option<i64>) {
    let (prev, next) = (expr.prev(id), expr.next(id));
    let (prev, next) = match (prev, next) {
        (Some(p), Some(n)) => (p, n),
        _ => return,
    };

    if !expr.get(prev).is_number() || !expr.get(next).is_number() {
        return;
    }

    let lhs = parse_i64(&expr.get(prev).text);
    let rhs = parse_i64(&expr.get(next).text);
    let result = match apply(&expr.get(id).text, lhs, rhs) {
        Some(result) => result,
        None => return,
    };

    expr.get_mut(id).text = result.to_string();
    expr.delete(prev);
    expr.delete(next);
}

fn const_fold_mul_div_rem(expr: &mut TokenList, open: Option<TokenId>) {
    let mut cur = open.or_else(|| expr.first());

    while let Some(id) = cur {
        if expr.get(id).op() == b')' {
            break;
        }

        fold_binary_at(expr, id, |op, lhs, rhs| match op {
            "*" => Some(lhs.wrapping_mul(rhs)),
            // Division and modulo by zero fold to 0 instead of faulting.
            "/" => Some(if rhs == 0 { 0 } else { lhs.wrapping_div(rhs) }),
            "%" => Some(if rhs == 0 { 0 } else { lhs.wrapping_rem(rhs) }),
            _ => None,
        });

        cur = expr.next(id);
    }
}

fn const_fold_add_sub(expr: &mut TokenList, open: Option<TokenId>) {
    let mut cur = open.or_else(|| expr.first());

    while let Some(id) = cur {
        if expr.get(id).op() == b')' {
            break;
        }

        fold_binary_at(expr, id, |op, lhs, rhs| match op {
            "+" => Some(lhs.wrapping_add(rhs)),
            "-" => Some(lhs.wrapping_sub(rhs)),
            _ => None,
        });

        cur = expr.next(id);
    }
}

fn const_fold_comparison(expr: &mut TokenList, open: Option<TokenId>) {
    let mut cur = open.or_else(|| expr.first());

    while let Some(id) = cur {
        if expr.get(id).op() == b')' {
            break;
        }

        fold_binary_at(expr, id, |op, lhs, rhs| {
            let result = match op {
                "==" => lhs == rhs,
                "!=" => lhs != rhs,
                "<" => lhs < rhs,
                "<=" => lhs <= rhs,
                ">" => lhs > rhs,
                ">=" => lhs >= rhs,
                _ => return None,
            };
            Some(result as i64)
        });

        cur = expr.next(id);
    }
}

fn const_fold_logical(expr: &mut TokenList, open: Option<TokenId>) {
    let mut cur = open.or_else(|| expr.first());

    while let Some(id) = cur {
        if expr.get(id).op() == b')' {
            break;
        }

        // Both sides are already numbers here, so there is nothing left to
        // short-circuit.
        fold_binary_at(expr, id, |op, lhs, rhs| match op {
            "&&" => Some((lhs != 0 && rhs != 0) as i64),
            "||" => Some((lhs != 0 || rhs != 0) as i64),
            _ => None,
        });

        cur = expr.next(id);
    }
}

/// Read a leading signed decimal value, wrapping on overflow. Trailing
/// non-digits (number tokens can carry suffixes the core doesn't model) are
/// ignored.
fn parse_i64(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let (neg, mut i) = match bytes.first() {
        Some(b'-') => (true, 1),
        _ => (false, 0),
    };

    let mut value: i64 = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add((b - b'0') as i64);
        i += 1;
    }

    if neg {
        return value.wrapping_neg();
    }
    return value;
}
