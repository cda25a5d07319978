//! Runner behavior over arbitrary fragment boundaries.
//!
//! These drive the runner with a recording canvas, the same way the
//! upstream app's tests drove it with a mocked capability object.

use canvas::{Op, Recorder};
use doodle_runtime::Runner;

const TWO_STATEMENTS: &str =
    "roughCanvas.line(0, 0, 10, 10, { stroke: 'red' });\nroughCanvas.circle(100, 100, 50);";

fn runner() -> (Runner<Recorder>, Recorder) {
    let recorder = Recorder::new();
    let runner = Runner::with_seed(recorder.clone(), 0);
    (runner, recorder)
}

#[test]
fn single_push_executes_a_complete_statement() {
    let (mut runner, recorder) = runner();
    runner.push("roughCanvas.line(0,0,10,10);");
    assert_eq!(
        recorder.draws(),
        vec![Op::Line(0.0, 0.0, 10.0, 10.0, Default::default())]
    );
}

#[test]
fn every_two_way_split_yields_the_same_final_frame() {
    let baseline = {
        let (mut runner, recorder) = runner();
        runner.push(TWO_STATEMENTS);
        recorder.last_frame()
    };
    assert_eq!(baseline.len(), 2);

    for cut in 0..=TWO_STATEMENTS.len() {
        let (mut runner, recorder) = runner();
        runner.push(&TWO_STATEMENTS[..cut]);
        runner.push(&TWO_STATEMENTS[cut..]);
        assert_eq!(recorder.last_frame(), baseline, "split at byte {cut}");
    }
}

#[test]
fn many_way_splits_yield_the_same_final_frame() {
    let baseline = {
        let (mut runner, recorder) = runner();
        runner.push(TWO_STATEMENTS);
        recorder.last_frame()
    };

    for size in 1..8 {
        let (mut runner, recorder) = runner();
        let chars: Vec<char> = TWO_STATEMENTS.chars().collect();
        for chunk in chars.chunks(size) {
            runner.push(&chunk.iter().collect::<String>());
        }
        assert_eq!(recorder.last_frame(), baseline, "chunk size {size}");
    }
}

#[test]
fn incomplete_prefix_draws_nothing_and_never_resets() {
    let (mut runner, recorder) = runner();
    runner.push("roughCanvas.line(0, 0,");
    assert!(recorder.ops().is_empty());
    assert_eq!(recorder.clears(), 0);
}

#[test]
fn buffered_split_statement_executes_once_complete() {
    let (mut runner, recorder) = runner();

    runner.push("roughCan");
    assert!(recorder.draws().is_empty());

    runner.push("vas.line(0,0,");
    assert!(recorder.draws().is_empty());

    runner.push("10,10);");
    // line() ran exactly once, only after the third push.
    let line_count = recorder
        .ops()
        .iter()
        .filter(|op| matches!(op, Op::Line(..)))
        .count();
    assert_eq!(line_count, 1);
    assert_eq!(
        recorder.last_frame(),
        vec![Op::Line(0.0, 0.0, 10.0, 10.0, Default::default())]
    );
}

#[test]
fn appended_statements_replay_without_visible_duplication() {
    let (mut runner, recorder) = runner();

    runner.push("roughCanvas.line(0,0,10,10);");
    assert_eq!(recorder.last_frame().len(), 1);

    runner.push(" roughCanvas.circle(100,100,50);");
    // Full-replay model: the visible frame holds one op per statement,
    // not one per push.
    let frame = recorder.last_frame();
    assert_eq!(frame.len(), 2);
    assert!(matches!(frame[0], Op::Line(..)));
    assert!(
        matches!(frame[1], Op::Circle(cx, cy, d, _) if (cx, cy, d) == (100.0, 100.0, 50.0))
    );
}

#[test]
fn markdown_fences_are_stripped_even_when_split() {
    let (mut runner, recorder) = runner();
    runner.push("```javascript\n");
    runner.push("roughCanvas.line(0,0,10,10);\n");
    runner.push("``");
    runner.push("`");
    assert_eq!(
        recorder.last_frame(),
        vec![Op::Line(0.0, 0.0, 10.0, 10.0, Default::default())]
    );
}

#[test]
fn finish_reruns_everything_from_a_fresh_reset() {
    let (mut runner, recorder) = runner();
    runner.push("roughCanvas.line(0,0,10,10);");
    runner.push(" roughCanvas.rectangle(0,0,10,10);");
    assert_eq!(recorder.last_frame().len(), 2);

    recorder.reset();
    runner.finish().unwrap();
    let ops = recorder.ops();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0], Op::Clear);
    assert!(matches!(ops[1], Op::Line(..)));
    assert!(matches!(ops[2], Op::Rectangle(..)));
}

#[test]
fn finish_fails_when_the_program_never_became_valid() {
    let (mut runner, recorder) = runner();
    runner.push("roughCanvas.line(0, 0,");
    let err = runner.finish().unwrap_err();
    assert!(err.is_parse());
    // The terminal pass still reset the surface before compiling.
    assert_eq!(recorder.clears(), 1);
    assert!(recorder.draws().is_empty());
}

#[test]
fn finish_with_runs_the_callback_before_the_replay() {
    let (mut runner, recorder) = runner();
    runner.push("roughCanvas.circle(1, 1, 1);");

    let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen_in_cb = seen.clone();
    let recorder_in_cb = recorder.clone();
    recorder.reset();
    runner
        .finish_with(move || {
            // At callback time the terminal reset has not happened yet.
            seen_in_cb.store(
                recorder_in_cb.ops().len(),
                std::sync::atomic::Ordering::SeqCst,
            );
        })
        .unwrap();
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(recorder.clears(), 1);
}

#[test]
fn mid_replay_fault_keeps_the_prefix_and_retries_later() {
    let (mut runner, recorder) = runner();
    // Second statement faults at runtime (unknown method); first one drew.
    runner.push("roughCanvas.line(0,0,10,10);\nroughCanvas.bogus();");
    assert_eq!(recorder.last_frame().len(), 1);

    // More text arrives that still includes the faulting statement; the
    // replay keeps stopping at it, applying only the prefix.
    runner.push("\nroughCanvas.circle(1,1,1);");
    assert_eq!(recorder.last_frame().len(), 1);
    assert!(matches!(recorder.last_frame()[0], Op::Line(..)));

    // And finish reports it as terminal.
    assert!(runner.finish().unwrap_err().is_runtime());
}

#[test]
fn buffer_and_code_accessors() {
    let (mut runner, _recorder) = runner();
    runner.push("```javascript\nroughCanvas.circle(1,1,1);");
    assert!(runner.buffer().starts_with("```javascript"));
    assert_eq!(runner.code(), "\nroughCanvas.circle(1,1,1);");
}
