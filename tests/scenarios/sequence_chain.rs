//! Test: sequential chaining

use crate::helpers::*;
use runnable::execution::erased::Erased;
use runnable::{Error, Lambda, RunContext, Runnable, RunnableExt, Sequence};

#[test]
fn test_upper_then_length() {
    let chain = upper().then(length());
    assert_eq!(chain.invoke("abc".to_string(), &RunContext::new()).unwrap(), 3);
}

#[test]
fn test_stages_run_in_order() {
    let chain = Lambda::new(|s: String| format!("{}a", s))
        .then(Lambda::new(|s: String| format!("{}b", s)))
        .then(Lambda::new(|s: String| format!("{}c", s)));
    assert_eq!(chain.invoke(String::new(), &RunContext::new()).unwrap(), "abc");
}

#[test]
fn test_failing_stage_stops_the_chain() {
    let failing = FailOn::new(2);
    let after = Lambda::new(|x: i32| -> i32 { panic!("stage after a failure ran with {}", x) });
    let chain = times(2).then(failing).then(after);

    let err = chain.invoke(1, &RunContext::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

#[test]
fn test_stream_yields_from_last_stage() {
    let chain = upper().then(Lambda::generator(|s: String| {
        s.chars().map(|c| c.to_string()).collect::<Vec<_>>()
    }));
    let chunks: Vec<String> = chain
        .stream("ab".to_string(), RunContext::new())
        .collect::<runnable::Result<_>>()
        .unwrap();
    assert_eq!(chunks, vec!["A", "B"]);
}

#[test]
fn test_from_stages_rejects_mismatched_neighbours() {
    let result = Sequence::<String, usize>::from_stages(vec![
        Erased::stage(upper()),
        Erased::stage(times(2)),
    ]);
    match result {
        Err(Error::InvalidComposition(message)) => assert!(message.contains("type mismatch")),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("mismatched stages were accepted"),
    }
}

#[test]
fn test_from_stages_accepts_matching_neighbours() {
    let chain = Sequence::<String, usize>::from_stages(vec![
        Erased::stage(upper()),
        Erased::stage(length()),
    ])
    .unwrap();
    assert_eq!(chain.invoke("four".to_string(), &RunContext::new()).unwrap(), 4);
}

#[test]
fn test_from_stages_needs_two_stages() {
    let result = Sequence::<String, String>::from_stages(vec![Erased::stage(upper())]);
    assert!(matches!(result, Err(Error::InvalidComposition(_))));
}
