use speechbridge::AudioInlet;

fn drain(inlet: &AudioInlet) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while let Some(frame) = inlet.pop() {
        frames.push(frame);
    }
    frames
}

#[test]
fn test_frames_buffered_until_ready() {
    let inlet = AudioInlet::new();
    inlet.submit(vec![1]);
    inlet.submit(vec![2]);

    assert!(!inlet.is_ready());
    assert_eq!(inlet.pending_len(), 2);
    assert_eq!(inlet.pop(), None);

    inlet.mark_ready();
    assert_eq!(drain(&inlet), vec![vec![1], vec![2]]);
}

#[test]
fn test_order_preserved_across_ready_boundary() {
    // The ready transition may land between any two submissions; the
    // arrival order must match the submission order regardless.
    let frames: Vec<Vec<u8>> = (0u8..10).map(|i| vec![i]).collect();

    for ready_after in 0..=frames.len() {
        let inlet = AudioInlet::new();
        for (i, frame) in frames.iter().enumerate() {
            if i == ready_after {
                inlet.mark_ready();
            }
            inlet.submit(frame.clone());
        }
        if ready_after == frames.len() {
            inlet.mark_ready();
        }

        assert_eq!(drain(&inlet), frames, "ready_after={}", ready_after);
    }
}

#[test]
fn test_submissions_after_ready_skip_buffer() {
    let inlet = AudioInlet::new();
    inlet.mark_ready();
    inlet.submit(vec![7]);

    assert_eq!(inlet.pending_len(), 0);
    assert_eq!(inlet.outbound_len(), 1);
}

#[test]
fn test_closed_inlet_discards_silently() {
    let inlet = AudioInlet::new();
    inlet.submit(vec![1]);
    inlet.close();

    assert!(inlet.is_closed());
    assert_eq!(inlet.pop(), None);

    // Submissions after close never reach a queue.
    inlet.submit(vec![2]);
    assert_eq!(inlet.pending_len(), 0);
    assert_eq!(inlet.outbound_len(), 0);

    // Nor does a late ready transition revive it.
    inlet.mark_ready();
    inlet.submit(vec![3]);
    assert_eq!(inlet.pop(), None);
}

#[test]
fn test_pending_overflow_drops_oldest() {
    let inlet = AudioInlet::with_pending_capacity(3);
    for i in 0u8..5 {
        inlet.submit(vec![i]);
    }

    assert_eq!(inlet.pending_len(), 3);
    assert_eq!(inlet.dropped(), 2);
    inlet.mark_ready();
    assert_eq!(drain(&inlet), vec![vec![2], vec![3], vec![4]]);
}
