use proptest::prelude::*;
use shadowgl_server::{ContextRegistry, Current, DestroyFlags, RegistryError};
use shadowgl_types::{Context, Display, Surface};

const DPY: Display = Display(1);
const WORKERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    MakeCurrent { worker: usize, context: u64, surface: u64 },
    Release { worker: usize },
    DestroyContext { context: u64 },
    DestroySurface { surface: u64 },
    Terminate { worker: usize },
    Initialize,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..WORKERS, 0u64..4, 0u64..3)
            .prop_map(|(worker, context, surface)| Op::MakeCurrent { worker, context, surface }),
        2 => (0..WORKERS).prop_map(|worker| Op::Release { worker }),
        1 => (0u64..4).prop_map(|context| Op::DestroyContext { context }),
        1 => (0u64..3).prop_map(|surface| Op::DestroySurface { surface }),
        1 => (0..WORKERS).prop_map(|worker| Op::Terminate { worker }),
        1 => Just(Op::Initialize),
    ]
}

fn ctx(n: u64) -> Context {
    Context(100 + n)
}

fn surf(n: u64) -> Surface {
    Surface(10 + n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn currency_and_deferred_destroy_hold(ops in proptest::collection::vec(op(), 1..48)) {
        let registry = ContextRegistry::new();
        let mut workers: Vec<Option<Current>> = (0..WORKERS).map(|_| None).collect();

        for op in ops {
            match op {
                Op::MakeCurrent { worker, context, surface } => {
                    let held_elsewhere = workers
                        .iter()
                        .enumerate()
                        .any(|(i, c)| i != worker && c.as_ref().is_some_and(|c| c.context == ctx(context)));
                    let result = registry.make_current(
                        DPY,
                        surf(surface),
                        surf(surface),
                        ctx(context),
                        &mut workers[worker],
                    );
                    if held_elsewhere {
                        let busy = matches!(result, Err(RegistryError::ContextBusy { .. }));
                        prop_assert!(busy);
                    } else {
                        prop_assert!(result.is_ok());
                        let current = workers[worker].as_ref().unwrap();
                        prop_assert_eq!(current.context, ctx(context));
                    }
                }
                Op::Release { worker } => {
                    if let Some(current) = workers[worker].take() {
                        registry.release(current);
                    }
                }
                Op::DestroyContext { context } => {
                    registry.destroy_context(DPY, ctx(context));
                    for record in registry.records().iter().filter(|r| r.context == ctx(context)) {
                        prop_assert!(record.active);
                        prop_assert!(record.destroy.contains(DestroyFlags::CONTEXT));
                    }
                }
                Op::DestroySurface { surface } => {
                    registry.destroy_surface(DPY, surf(surface));
                    for record in registry.records().iter().filter(|r| !r.active) {
                        prop_assert_ne!(record.draw, surf(surface));
                        prop_assert_ne!(record.read, surf(surface));
                    }
                }
                Op::Terminate { worker } => {
                    registry.terminate(DPY, workers[worker].as_ref());
                    prop_assert!(registry.records().iter().all(|r| r.active));
                }
                Op::Initialize => registry.initialize(DPY),
            }

            let records = registry.records();
            let held: Vec<_> = workers.iter().flatten().collect();
            prop_assert_eq!(records.iter().filter(|r| r.active).count(), held.len());
            for current in &held {
                let snap = registry.snapshot(current.handle()).unwrap();
                prop_assert!(snap.active);
                let same_context = records.iter().filter(|r| r.active && r.context == current.context).count();
                prop_assert_eq!(same_context, 1);
            }
            for record in records.iter().filter(|r| !r.active) {
                prop_assert!(record.destroy.is_empty(), "pending flags on an inactive record");
            }
        }

        for current in workers.iter_mut().filter_map(Option::take) {
            registry.release(current);
        }
        prop_assert!(registry.records().iter().all(|r| !r.active && r.destroy.is_empty()));
    }
}
