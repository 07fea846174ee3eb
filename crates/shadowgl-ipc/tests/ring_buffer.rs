use shadowgl_ipc::ring::{MirroredRing, PushError};
use shadowgl_ipc::{RingConfig, TransportMode};
use std::collections::VecDeque;

struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        ((x.wrapping_mul(0x2545F4914F6CDD1D)) >> 32) as u32
    }

    fn gen_range(&mut self, max_exclusive: u32) -> u32 {
        if max_exclusive == 0 {
            return 0;
        }
        self.next_u32() % max_exclusive
    }

    fn fill_bytes(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b = (self.next_u32() & 0xFF) as u8;
        }
    }
}

fn config(capacity: usize, mode: TransportMode) -> RingConfig {
    RingConfig::default().with_capacity(capacity).with_mode(mode)
}

#[test]
fn ring_buffer_single_thread_fuzz() {
    let (mut tx, mut rx) = MirroredRing::create(&config(1, TransportMode::BusyPoll)).unwrap();
    let cap = tx.ring().capacity();
    let mut model: VecDeque<u8> = VecDeque::new();
    let mut rng = Rng::new(0x1234_5678_9ABC_DEF0);

    for _ in 0..20_000 {
        match rng.gen_range(2) {
            0 => {
                let want = rng.gen_range(cap as u32 / 3) as usize;
                match tx.writable_region() {
                    Some(region) => {
                        let n = want.min(region.len());
                        rng.fill_bytes(&mut region[..n]);
                        model.extend(region[..n].iter().copied());
                        tx.commit_write(n);
                    }
                    None => assert_eq!(model.len(), cap),
                }
            }
            _ => {
                let want = rng.gen_range(cap as u32 / 3) as usize;
                match rx.readable_region() {
                    Some(region) => {
                        let n = want.min(region.len());
                        for (i, b) in region[..n].iter().enumerate() {
                            assert_eq!(Some(b), model.get(i));
                        }
                        model.drain(..n);
                        rx.commit_read(n);
                    }
                    None => assert!(model.is_empty()),
                }
            }
        }
        assert_eq!(rx.ring().entry_count(), model.len());
        assert!(rx.ring().entry_count() <= cap);
    }
}

#[test]
fn wraparound_read_back_is_identical() {
    let (mut tx, mut rx) = MirroredRing::create(&config(1024, TransportMode::BusyPoll)).unwrap();
    let cap = tx.ring().capacity();
    assert!(cap >= 1024);

    let mut rng = Rng::new(7);
    let mut written = 0usize;
    // Keep cycling 900-byte records until the stream has crossed the end of the region twice.
    while written < 2 * cap + 900 {
        let mut msg = vec![0u8; 900];
        rng.fill_bytes(&mut msg);
        tx.push(&msg).unwrap();
        let region = rx.readable_region().unwrap();
        assert_eq!(region, &msg[..]);
        rx.commit_read(900);
        written += 900;
    }
    assert_eq!(rx.ring().entry_count(), 0);
}

fn spsc_round_trip(mode: TransportMode) {
    let (mut tx, mut rx) = MirroredRing::create(&config(1, mode)).unwrap();

    const N: u32 = 100_000;

    let t_prod = std::thread::spawn(move || {
        for i in 0..N {
            tx.push(&i.to_le_bytes()).unwrap();
        }
        tx
    });

    let t_cons = std::thread::spawn(move || {
        for i in 0..N {
            let msg = rx.pop_exact(4);
            let got = u32::from_le_bytes(msg[..4].try_into().unwrap());
            assert_eq!(got, i);
        }
        rx
    });

    let _tx = t_prod.join().unwrap();
    let rx = t_cons.join().unwrap();
    assert!(rx.ring().is_empty());
}

#[test]
fn ring_buffer_spsc_busy_poll() {
    spsc_round_trip(TransportMode::BusyPoll);
}

#[test]
fn ring_buffer_spsc_blocking() {
    spsc_round_trip(TransportMode::Blocking);
}

#[test]
fn ring_buffer_rejects_too_large_record() {
    let (mut tx, _rx) = MirroredRing::create(&config(64, TransportMode::BusyPoll)).unwrap();
    let payload = vec![0u8; tx.ring().capacity() + 1];
    assert_eq!(tx.try_push(&payload), Err(PushError::TooLarge));
    assert_eq!(tx.push(&payload), Err(PushError::TooLarge));
}

#[test]
fn ring_buffer_reports_full() {
    let (mut tx, _rx) = MirroredRing::create(&config(1, TransportMode::BusyPoll)).unwrap();
    let cap = tx.ring().capacity();
    tx.try_push(&vec![1u8; cap - 1]).unwrap();
    assert_eq!(tx.try_push(&[0, 0]), Err(PushError::Full));
    tx.try_push(&[0]).unwrap();
    assert!(tx.writable_region().is_none());
}
