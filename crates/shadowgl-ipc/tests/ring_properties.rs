use proptest::prelude::*;
use shadowgl_ipc::ring::MirroredRing;
use shadowgl_ipc::RingConfig;

#[derive(Debug, Clone)]
enum Op {
    Write(usize),
    Read(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6000).prop_map(Op::Write),
        (0usize..6000).prop_map(Op::Read),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fill_count_tracks_bytes_in_flight(ops in proptest::collection::vec(op(), 1..64)) {
        let (mut tx, mut rx) = MirroredRing::create(&RingConfig::default().with_capacity(4096)).unwrap();
        let cap = tx.ring().capacity();
        let mut written = 0usize;
        let mut read = 0usize;

        for op in ops {
            match op {
                Op::Write(n) => {
                    let n = n.min(cap - (written - read));
                    if n > 0 {
                        let region = tx.writable_region().unwrap();
                        prop_assert!(region.len() >= n);
                        tx.commit_write(n);
                        written += n;
                    }
                }
                Op::Read(n) => {
                    let n = n.min(written - read);
                    if n > 0 {
                        let region = rx.readable_region().unwrap();
                        prop_assert!(region.len() >= n);
                        rx.commit_read(n);
                        read += n;
                    }
                }
            }
            let fill = rx.ring().entry_count();
            prop_assert_eq!(fill, written - read);
            prop_assert!(fill <= cap);
        }
    }

    #[test]
    fn writes_read_back_contiguously_from_any_offset(
        skew in 0usize..8192,
        data in proptest::collection::vec(any::<u8>(), 1..4096),
    ) {
        let (mut tx, mut rx) = MirroredRing::create(&RingConfig::default().with_capacity(4096)).unwrap();
        let cap = tx.ring().capacity();
        prop_assume!(data.len() <= cap);

        // Move both cursors to an arbitrary offset first.
        let skew = skew % cap;
        if skew > 0 {
            tx.writable_region().unwrap();
            tx.commit_write(skew);
            rx.commit_read(skew);
        }

        let region = tx.writable_region().unwrap();
        region[..data.len()].copy_from_slice(&data);
        tx.commit_write(data.len());

        let out = rx.readable_region().unwrap();
        prop_assert_eq!(out, &data[..]);
    }
}
