// tests/expand_examples.rs

use std::error::Error;

use bulkexec::dry_run_lines;
use bulkexec::errors::BulkExecError;
use bulkexec::expand::{ExpansionPlan, Resolved, expand};
use bulkexec::expr::Limits;
use bulkexec_test_utils::tokens;

type TestResult = Result<(), Box<dyn Error>>;

fn run(raw: &[&str]) -> Result<Vec<Vec<String>>, BulkExecError> {
    expand(&tokens(raw), &Limits::default())
}

#[test]
fn arithmetic_token_is_evaluated() -> TestResult {
    assert_eq!(run(&["echo", "10 ** 5"])?, vec![tokens(&["echo", "100000"])]);
    Ok(())
}

#[test]
fn range_expands_to_one_invocation_per_element() -> TestResult {
    let invocations = run(&["echo", "range(5)"])?;
    let expected: Vec<Vec<String>> = (0..5)
        .map(|i| vec!["echo".to_string(), i.to_string()])
        .collect();
    assert_eq!(invocations, expected);
    Ok(())
}

#[test]
fn shorter_expandables_cycle() -> TestResult {
    assert_eq!(
        run(&["echo", "range(2)", "range(4)"])?,
        vec![
            tokens(&["echo", "0", "0"]),
            tokens(&["echo", "1", "1"]),
            tokens(&["echo", "0", "2"]),
            tokens(&["echo", "1", "3"]),
        ]
    );
    Ok(())
}

#[test]
fn quoted_flag_becomes_plain_text() -> TestResult {
    assert_eq!(run(&["ping", "'-h'"])?, vec![tokens(&["ping", "-h"])]);
    Ok(())
}

#[test]
fn empty_expandable_means_no_invocations() -> TestResult {
    assert!(run(&["echo", "[]"])?.is_empty());
    assert!(run(&["echo", "range(3)", "range(0)"])?.is_empty());
    Ok(())
}

#[test]
fn non_expressions_pass_through_unchanged() -> TestResult {
    let raw = ["ls", "-l", "foo.txt", "2024-01-01", "1/0", "9223372036854775807 + 1", "a b"];
    assert_eq!(run(&raw)?, vec![tokens(&raw)]);
    Ok(())
}

#[test]
fn elements_render_like_python_str() -> TestResult {
    assert_eq!(
        run(&["echo", "['a b', 1.0, (1, 2), None]"])?,
        vec![
            tokens(&["echo", "a b"]),
            tokens(&["echo", "1.0"]),
            tokens(&["echo", "(1, 2)"]),
            tokens(&["echo", "None"]),
        ]
    );
    assert_eq!(run(&["echo", "b'raw'"])?, vec![tokens(&["echo", "b'raw'"])]);
    assert_eq!(
        run(&["echo", "{'x': 1, 'y': 2}"])?,
        vec![tokens(&["echo", "x"]), tokens(&["echo", "y"])]
    );
    Ok(())
}

#[test]
fn strings_are_scalars_not_expandables() -> TestResult {
    let plan = ExpansionPlan::build(&tokens(&["echo", "'abc'", "[1]"]), &Limits::default())?;
    assert_eq!(
        plan.slots(),
        &[
            Resolved::Scalar("echo".to_string()),
            Resolved::Scalar("abc".to_string()),
            Resolved::Expandable(vec!["1".to_string()]),
        ]
    );
    Ok(())
}

#[test]
fn n_sees_expandables_to_its_left() -> TestResult {
    assert_eq!(
        run(&["echo", "'{:02d}'.format(n)", "range(3)", "n"])?,
        vec![
            tokens(&["echo", "01", "0", "3"]),
            tokens(&["echo", "01", "1", "3"]),
            tokens(&["echo", "01", "2", "3"]),
        ]
    );
    Ok(())
}

#[test]
fn unbounded_sequence_is_a_user_error() {
    for token in ["range(10**12)", "list(range(10**7))", "'x' * 10**7"] {
        match run(&["echo", token]) {
            Err(BulkExecError::UnboundedSequence { token: t, limit }) => {
                assert_eq!(t, token);
                assert_eq!(limit, 1_000_000);
            }
            other => panic!("expected an unbounded sequence error for {token}, got {other:?}"),
        }
    }
}

#[test]
fn limit_is_configurable() {
    let limits = Limits::new(3);
    assert!(expand(&tokens(&["echo", "range(3)"]), &limits).is_ok());
    assert!(matches!(
        expand(&tokens(&["echo", "range(4)"]), &limits),
        Err(BulkExecError::UnboundedSequence { limit: 3, .. })
    ));
}

#[test]
fn dry_run_lines_are_shell_quoted() -> TestResult {
    let plan = ExpansionPlan::build(&tokens(&["echo", "['a b', 'c']"]), &Limits::default())?;
    assert_eq!(dry_run_lines(&plan), ["echo 'a b'", "echo c"]);
    Ok(())
}
