use std::sync::{Arc, Mutex};
use std::time::Duration;

use speechbridge::{BatchLimits, FlushScheduler, SentenceAccumulator};
use tokio::sync::mpsc;

fn short_limits() -> BatchLimits {
    BatchLimits {
        partial_timeout: Duration::from_millis(50),
        sentence_timeout: Duration::from_millis(100),
        ..BatchLimits::default()
    }
}

fn setup() -> (
    Arc<Mutex<SentenceAccumulator>>,
    FlushScheduler,
    mpsc::UnboundedReceiver<String>,
) {
    let accumulator = Arc::new(Mutex::new(SentenceAccumulator::new(short_limits())));
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = FlushScheduler::new(accumulator.clone(), move |batch| {
        let _ = tx.send(batch.text);
    });
    (accumulator, scheduler, rx)
}

#[tokio::test]
async fn test_partial_timer_flushes_partial_text() {
    let (accumulator, scheduler, mut rx) = setup();

    assert!(accumulator.lock().unwrap().ingest("그리고 생각해보면").is_none());
    scheduler.rearm();

    let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timer must fire")
        .unwrap();
    assert_eq!(text, "그리고 생각해보면");
    assert_eq!(accumulator.lock().unwrap().partial_text(), "");
}

#[tokio::test]
async fn test_rearm_cancels_previous_timer() {
    let (accumulator, scheduler, mut rx) = setup();

    accumulator.lock().unwrap().ingest("그리고 생각해보면");
    scheduler.rearm();

    // More text arrives before the short timer fires; the long timer
    // takes over and only one flush happens.
    tokio::time::sleep(Duration::from_millis(20)).await;
    accumulator.lock().unwrap().ingest("좋은 생각이 났습니다");
    scheduler.rearm();

    let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("rearmed timer must fire")
        .unwrap();
    assert_eq!(text, "그리고 생각해보면 좋은 생각이 났습니다");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err(), "only one flush may fire");
}

#[tokio::test]
async fn test_cancel_prevents_flush() {
    let (accumulator, scheduler, mut rx) = setup();

    accumulator.lock().unwrap().ingest("그리고 생각해보면");
    scheduler.rearm();
    scheduler.cancel();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
    // The text stays buffered for the next ingest.
    assert_eq!(
        accumulator.lock().unwrap().partial_text(),
        "그리고 생각해보면"
    );
}

#[tokio::test]
async fn test_timer_after_inline_flush_is_noop() {
    let (accumulator, scheduler, mut rx) = setup();

    // Inline flush: the accumulator requests no timer afterwards.
    let batch = accumulator
        .lock()
        .unwrap()
        .ingest("안녕하세요 반갑습니다 저는 발표를 시작합니다 오늘 날씨가 좋습니다");
    assert!(batch.is_some());
    scheduler.rearm();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}
