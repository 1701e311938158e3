// tests/expr_eval.rs

use bulkexec::expr::{EvalContext, EvalError, Limits, evaluate};

fn show_with(source: &str, ctx: &EvalContext) -> String {
    match evaluate(source, ctx) {
        Ok(value) => value.to_string(),
        Err(err) => panic!("`{source}` failed to evaluate: {err}"),
    }
}

fn show(source: &str) -> String {
    show_with(source, &EvalContext::default())
}

fn fails(source: &str) -> EvalError {
    match evaluate(source, &EvalContext::default()) {
        Ok(value) => panic!("`{source}` unexpectedly evaluated to {value}"),
        Err(err) => err,
    }
}

#[test]
fn arithmetic_follows_python_semantics() {
    assert_eq!(show("10 ** 5"), "100000");
    assert_eq!(show("7 // 2"), "3");
    assert_eq!(show("-7 // 2"), "-4");
    assert_eq!(show("-7 % 3"), "2");
    assert_eq!(show("7 / 2"), "3.5");
    assert_eq!(show("1 / 3"), "0.3333333333333333");
    assert_eq!(show("0.1 + 0.2"), "0.30000000000000004");
    assert_eq!(show("2 ** -1"), "0.5");
    assert_eq!(show("1e16"), "1e+16");
    assert_eq!(show("0x1F + 0o10 + 0b11"), "42");
    assert_eq!(show("1_000 * 3"), "3000");
    assert_eq!(show("~5, 1 << 4, -16 >> 2"), "(-6, 16, -4)");
}

#[test]
fn containers_render_with_repr_elements() {
    assert_eq!(show("[1, 'a', None]"), "[1, 'a', None]");
    assert_eq!(show("(1,)"), "(1,)");
    assert_eq!(show("{'k': [1, 2]}"), "{'k': [1, 2]}");
    assert_eq!(show("{3, 1, 3}"), "{3, 1}");
    assert_eq!(show("{1, 2} | {2, 3}"), "{1, 2, 3}");
    assert_eq!(show("{1, 2} & {2, 3}"), "{2}");
    assert_eq!(show("'a' + 'b' * 3"), "abbb");
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(show("1 < 2 < 3"), "True");
    assert_eq!(show("1 < 3 < 2"), "False");
    assert_eq!(show("'b' in 'abc' and 3 not in [1, 2]"), "True");
    assert_eq!(show("None is None"), "True");
    assert_eq!(show("[] or 'fallback'"), "fallback");
    assert_eq!(
        show_with("'yes' if n > 2 else 'no'", &EvalContext::new(3, Limits::default())),
        "yes"
    );
}

#[test]
fn indexing_and_slicing() {
    assert_eq!(show("[0, 1, 2, 3, 4][::-2]"), "[4, 2, 0]");
    assert_eq!(show("'hello'[1:-1]"), "ell");
    assert_eq!(show("'hello'[-1]"), "o");
    assert_eq!(show("range(10)[2:8:3]"), "range(2, 8, 3)");
    assert_eq!(show("{'a': 1}['a']"), "1");
}

#[test]
fn comprehensions() {
    assert_eq!(show("[x * 2 for x in range(4) if x % 2 == 0]"), "[0, 4]");
    assert_eq!(
        show("[f'{a}{b}' for a in 'ab' for b in range(2)]"),
        "['a0', 'a1', 'b0', 'b1']"
    );
    assert_eq!(
        show("{k: v for k, v in zip('ab', range(2))}"),
        "{'a': 0, 'b': 1}"
    );
    assert_eq!(show("sum(x for x in range(5))"), "10");
    assert_eq!(show("[i for i, _ in enumerate('xyz')]"), "[0, 1, 2]");
    assert_eq!(show("(x for x in range(3))"), "[0, 1, 2]");
}

#[test]
fn builtin_functions() {
    assert_eq!(show("sorted([3, 1, 2], reverse=True)"), "[3, 2, 1]");
    assert_eq!(show("list(reversed('abc'))"), "['c', 'b', 'a']");
    assert_eq!(show("min(4, 2, 8), max([1, 5])"), "(2, 5)");
    assert_eq!(show("round(0.5), round(1.5)"), "(0, 2)");
    assert_eq!(show("round(2.675, 2)"), "2.67");
    assert_eq!(show("int('ff', 16), int(3.9), float('1e3')"), "(255, 3, 1000.0)");
    assert_eq!(show("str(1.0)"), "1.0");
    assert_eq!(show("len(range(0, 100, 7))"), "15");
    assert_eq!(show("chr(65) + str(ord('a'))"), "A97");
    assert_eq!(show("abs(-3), bool([])"), "(3, False)");
    assert_eq!(show("list(enumerate('ab', 1))"), "[(1, 'a'), (2, 'b')]");
    assert_eq!(show("tuple(set([2, 2, 1]))"), "(2, 1)");
}

#[test]
fn repeat_is_elementwise() {
    assert_eq!(show("repeat(range(3), 2)"), "[0, 0, 1, 1, 2, 2]");
    assert_eq!(show("repeat('x', 3)"), "['x', 'x', 'x']");
    assert_eq!(show("repeat([1, 2], [1, 3])"), "[1, 2, 2, 2]");
    assert!(matches!(fails("repeat([1, 2], [1, 2, 3])"), EvalError::Value(_)));
}

#[test]
fn string_methods_and_formatting() {
    assert_eq!(show("'a,b,,c'.split(',')"), "['a', 'b', '', 'c']");
    assert_eq!(show("' x  y '.split()"), "['x', 'y']");
    assert_eq!(show("'-'.join(str(i) for i in range(3))"), "0-1-2");
    assert_eq!(show("'  pad '.strip().upper().zfill(6)"), "000PAD");
    assert_eq!(show("'banana'.replace('a', 'o', 2)"), "bonona");
    assert_eq!(show("{'a': 1}.get('b', 0)"), "0");
    assert_eq!(show("'run-'.startswith(('x', 'run'))"), "True");

    assert_eq!(show("'%05.1f|%-4s|%x' % (3.14159, 'ab', 255)"), "003.1|ab  |ff");
    assert_eq!(show("'%d%%' % 50"), "50%");
    assert_eq!(
        show("'{:>6.2f}|{:^7}|{!r}'.format(3.14159, 'mid', 'q')"),
        "  3.14|  mid  |'q'"
    );
    assert_eq!(show("'{:,}'.format(1234567)"), "1,234,567");
    assert_eq!(show("'{:.3}'.format(2.0)"), "2.0");
    assert_eq!(show("'{:e}'.format(12345.678)"), "1.234568e+04");
    assert_eq!(show("'{:g}'.format(0.00001234)"), "1.234e-05");
    assert_eq!(show("'{name}-{0}'.format(1, name='job')"), "job-1");
    assert_eq!(show("'{:#x}'.format(255)"), "0xff");
}

#[test]
fn fstrings() {
    let ctx = EvalContext::new(7, Limits::default());
    assert_eq!(show_with(r#"f'{n:03d}-{"x".upper()}'"#, &ctx), "007-X");
    assert_eq!(show("f'{3.14159:.2f}'"), "3.14");
    assert_eq!(show("f'{[1, 2]!r} {{literal}}'"), "[1, 2] {literal}");
}

#[test]
fn n_is_read_only_context() {
    let ctx = EvalContext::new(4, Limits::default());
    assert_eq!(show_with("range(n)", &ctx), "range(0, 4)");
    assert_eq!(show_with("n * 2", &ctx), "8");
    assert_eq!(show("n"), "1");
}

#[test]
fn failures_are_reported_not_panicked() {
    assert!(matches!(fails("01"), EvalError::Syntax(_)));
    assert!(matches!(fails("lambda: 1"), EvalError::Syntax(_)));
    assert!(matches!(fails("1 +"), EvalError::Syntax(_)));
    assert_eq!(fails("9223372036854775807 + 1"), EvalError::Overflow);
    assert_eq!(fails("1 / 0"), EvalError::ZeroDivision);
    assert_eq!(fails("__import__('os')"), EvalError::Name("__import__".into()));
    assert_eq!(fails("len"), EvalError::Name("len".into()));
    assert_eq!(fails("echo"), EvalError::Name("echo".into()));
    assert!(matches!(fails("[1][5]"), EvalError::Index));
    assert!(matches!(fails("'a' + 1"), EvalError::Type(_)));
}

#[test]
fn sequences_are_bounded() {
    assert!(fails("list(range(10**7))").is_unbounded());
    assert!(fails("'x' * 10**7").is_unbounded());
    assert!(fails("'{:>99999999}'.format(1)").is_unbounded());

    let small = EvalContext::new(1, Limits::new(10));
    assert!(evaluate("list(range(10))", &small).is_ok());
    assert!(matches!(
        evaluate("list(range(11))", &small),
        Err(EvalError::Unbounded { len: 11, limit: 10 })
    ));
    // A lazy range is fine until something materializes it.
    assert_eq!(show("range(10**12)"), "range(0, 1000000000000)");
}

#[test]
fn sequences_repeat_by_integer_counts() {
    assert_eq!(show("[0] * 3"), "[0, 0, 0]");
    assert_eq!(show("3 * (1,)"), "(1, 1, 1)");
    assert_eq!(show("'ab' * 2"), "abab");
    assert_eq!(show("[1] * -1"), "[]");
    assert_eq!(show("[[1, 2]] * 2"), "[[1, 2], [1, 2]]");
    assert!(matches!(fails("[0] * 1.5"), EvalError::Type(_)));
    assert!(fails("[0] * (10**7)").is_unbounded());
}

#[test]
fn nested_repetition_counts_every_element() {
    let ctx = EvalContext::new(1, Limits::new(1000));
    assert!(evaluate("[0] * 1000", &ctx).is_ok());
    assert!(matches!(
        evaluate("[[0] * 1000] * 1000", &ctx),
        Err(EvalError::Unbounded { .. })
    ));
    assert!(matches!(
        evaluate("repeat([[0] * 100], 100)", &ctx),
        Err(EvalError::Unbounded { .. })
    ));
}
