//! ScriptedSource stream behavior.

use doodle_llm::{ScriptSource, ScriptedSource};
use futures_util::StreamExt;

#[tokio::test]
async fn fragments_arrive_in_order() {
    let source = ScriptedSource::new(["roughCan", "vas.line(0,0,", "10,10);"]);
    let stream = source.stream("a line");
    futures_util::pin_mut!(stream);

    let mut collected = String::new();
    while let Some(fragment) = stream.next().await {
        collected.push_str(&fragment.unwrap());
    }
    assert_eq!(collected, "roughCanvas.line(0,0,10,10);");
}

#[tokio::test]
async fn split_every_covers_the_whole_text() {
    let src = "roughCanvas.circle(256, 256, 200);";
    for size in [1, 3, 7, 100] {
        let source = ScriptedSource::split_every(src, size);
        let stream = source.stream("");
        futures_util::pin_mut!(stream);
        let mut collected = String::new();
        while let Some(fragment) = stream.next().await {
            collected.push_str(&fragment.unwrap());
        }
        assert_eq!(collected, src, "chunk size {size}");
    }
}

#[tokio::test]
async fn failing_after_ends_with_an_error() {
    let source = ScriptedSource::new(["a", "b", "c"]).failing_after(2);
    let stream = source.stream("");
    futures_util::pin_mut!(stream);

    assert_eq!(stream.next().await.unwrap().unwrap(), "a");
    assert_eq!(stream.next().await.unwrap().unwrap(), "b");
    assert!(stream.next().await.unwrap().is_err());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn each_stream_call_is_an_independent_attempt() {
    let source = ScriptedSource::new(["x;"]);
    for _ in 0..2 {
        let stream = source.stream("");
        futures_util::pin_mut!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), "x;");
        assert!(stream.next().await.is_none());
    }
}
