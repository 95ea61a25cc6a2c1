use crate::api::*;

fn eval(source: &str) -> i64 {
    return evaluate(lex(source, 0));
}

#[test]
#[timeout(300)]
fn test_precedence() {
    assert_eq!(eval("1+2*3"), 7);
    assert_eq!(eval("2*3+4*5"), 26);
    assert_eq!(eval("1+2==3"), 1);
    assert_eq!(eval("1 && 2 == 2"), 1);
}

#[test]
#[timeout(300)]
fn test_parentheses() {
    assert_eq!(eval("(1+2)*3"), 9);
    assert_eq!(eval("((1+2))*3"), 9);
    assert_eq!(eval("2*(3+(4*5))"), 46);
}

#[test]
#[timeout(300)]
fn test_division_and_modulo() {
    assert_eq!(eval("10/3"), 3);
    assert_eq!(eval("10%3"), 1);

    // division by zero evaluates to 0 instead of faulting
    assert_eq!(eval("1/0"), 0);
    assert_eq!(eval("1%0"), 0);
}

#[test]
#[timeout(300)]
fn test_logical_not() {
    assert_eq!(eval("!0"), 1);
    assert_eq!(eval("!5"), 0);
    assert_eq!(eval("!!7"), 1);
}

#[test]
#[timeout(300)]
fn test_comparisons() {
    assert_eq!(eval("1 < 2"), 1);
    assert_eq!(eval("2 <= 1"), 0);
    assert_eq!(eval("3 == 3"), 1);
    assert_eq!(eval("3 != 3"), 0);
    assert_eq!(eval("4 > 3"), 1);
    assert_eq!(eval("4 >= 5"), 0);
}

#[test]
#[timeout(300)]
fn test_logical_operators() {
    assert_eq!(eval("1 && 0"), 0);
    assert_eq!(eval("1 && 2"), 1);
    assert_eq!(eval("0 || 0"), 0);
    assert_eq!(eval("1 && 0 || 1"), 1);
}

#[test]
#[timeout(300)]
fn test_number_forms() {
    assert_eq!(eval("0x10"), 16);
    assert_eq!(eval("0xff == 255"), 1);
    assert_eq!(eval("'a'"), 97);
    assert_eq!(eval("'a' == 97"), 1);

    // the value of a character literal is its second character, so an
    // escape reads as the backslash
    assert_eq!(eval(r"'\n'"), 92);
}

#[test]
#[timeout(300)]
fn test_undefined_names_are_zero() {
    assert_eq!(eval("foo"), 0);
    assert_eq!(eval("foo + 3"), 3);
}

#[test]
#[timeout(300)]
fn test_sizeof() {
    assert_eq!(eval("sizeof(char)"), 1);
    assert_eq!(eval("sizeof(short)"), 2);
    assert_eq!(eval("sizeof(int)"), 4);
    assert_eq!(eval("sizeof int"), 4);
    assert_eq!(eval("sizeof(float)"), 4);
    assert_eq!(eval("sizeof(double)"), 8);

    // the last recognized primitive wins; unknown types are 0
    assert_eq!(eval("sizeof(unsigned long)"), 8);
    assert_eq!(eval("sizeof(foo)"), 0);

    assert_eq!(eval("sizeof(long) == 8"), 1);
}

#[test]
#[timeout(300)]
fn test_empty_expression_is_zero() {
    assert_eq!(eval(""), 0);
}

#[test]
#[timeout(300)]
fn test_negative_intermediate_stalls_folding() {
    // a folded negative number starts with '-', which is not a number token,
    // so it stops participating; the first token still reads as the result
    assert_eq!(eval("2-1"), 1);
    assert_eq!(eval("(1-2)*3"), -1);
}
