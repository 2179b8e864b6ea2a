use super::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn runtime() -> TestRuntime {
    TestRuntime::new()
}

#[test]
fn watch_runs_on_first_flush_and_replays_on_write() {
    let rt = runtime();
    let handle = rt.handle();
    let count = mutableStateOf(&handle, 1);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let _observer = watch(&handle, {
        let count = count.as_state();
        let seen = Rc::clone(&seen);
        move || seen.borrow_mut().push(count.value())
    });

    assert!(seen.borrow().is_empty());
    rt.runtime().flush();
    assert_eq!(*seen.borrow(), vec![1]);

    count.set_value(2);
    assert!(handle.has_pending_effects());
    rt.runtime().flush();
    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[test]
fn writes_request_a_flush_from_the_scheduler() {
    let rt = runtime();
    let handle = rt.handle();
    let value = mutableStateOf(&handle, 0);
    let _observer = watch(&handle, {
        let value = value.clone();
        move || {
            value.value();
        }
    });
    let before = rt.flush_requests();
    rt.runtime().flush();
    value.set_value(1);
    assert!(rt.flush_requests() > before);
    assert!(rt.runtime().needs_flush());
    rt.runtime().flush();
    assert!(!rt.runtime().needs_flush());
}

#[test]
fn observer_stops_tracking_cells_it_no_longer_reads() {
    let rt = runtime();
    let handle = rt.handle();
    let use_left = mutableStateOf(&handle, true);
    let left = mutableStateOf(&handle, 0);
    let right = mutableStateOf(&handle, 0);

    let observer = watch(&handle, {
        let use_left = use_left.clone();
        let left = left.clone();
        let right = right.clone();
        move || {
            if use_left.value() {
                left.value();
            } else {
                right.value();
            }
        }
    });
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 1);
    assert_eq!(observer.dependency_count(), 2);

    use_left.set_value(false);
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 2);

    left.set_value(10);
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 2, "stale read must not replay");

    right.set_value(10);
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 3);
}

#[test]
fn repeated_writes_before_flush_coalesce_into_one_run() {
    let rt = runtime();
    let handle = rt.handle();
    let value = mutableStateOf(&handle, 0);
    let observer = watch(&handle, {
        let value = value.clone();
        move || {
            value.value();
        }
    });
    rt.runtime().flush();

    value.set_value(1);
    value.set_value(2);
    value.set_value(3);
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 2);
}

#[test]
fn set_if_changed_skips_equal_values() {
    let rt = runtime();
    let handle = rt.handle();
    let value = mutableStateOf(&handle, "light".to_string());
    let observer = watch(&handle, {
        let value = value.clone();
        move || {
            value.value();
        }
    });
    rt.runtime().flush();

    assert!(!value.set_if_changed("light".to_string()));
    assert!(!handle.has_pending_effects());
    assert!(value.set_if_changed("dark".to_string()));
    rt.runtime().flush();
    assert_eq!(observer.run_count(), 2);
    assert_eq!(value.version(), 1);
}

#[test]
fn effect_body_runs_only_when_key_changes() {
    let rt = runtime();
    let handle = rt.handle();
    let dark = mutableStateOf(&handle, false);
    let unrelated = mutableStateOf(&handle, 0);
    let runs = Rc::new(Cell::new(0));

    let registration = effect(
        &handle,
        {
            let dark = dark.clone();
            let unrelated = unrelated.clone();
            move || {
                // Read but bucketed so the key stays stable.
                let _ = unrelated.value() > 100;
                dark.value()
            }
        },
        {
            let runs = Rc::clone(&runs);
            move |_| {
                runs.set(runs.get() + 1);
                EffectResult::default()
            }
        },
    );

    rt.runtime().flush();
    assert_eq!(runs.get(), 1);

    unrelated.set_value(5);
    rt.runtime().flush();
    assert_eq!(runs.get(), 1);

    dark.set_value(true);
    rt.runtime().flush();
    assert_eq!(runs.get(), 2);
    assert_eq!(registration.run_count(), 2);
}

#[test]
fn effect_cleanup_runs_before_replay_and_on_dispose() {
    let rt = runtime();
    let handle = rt.handle();
    let key = mutableStateOf(&handle, 0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let registration = effect(
        &handle,
        {
            let key = key.clone();
            move || key.value()
        },
        {
            let key = key.clone();
            let log = Rc::clone(&log);
            move |scope| {
                let current = key.with_untracked(|value| *value);
                log.borrow_mut().push(format!("run {current}"));
                let log = Rc::clone(&log);
                scope.on_dispose(move || log.borrow_mut().push(format!("cleanup {current}")))
            }
        },
    );

    rt.runtime().flush();
    key.set_value(1);
    rt.runtime().flush();
    registration.dispose();

    assert_eq!(
        *log.borrow(),
        vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
    );
    assert!(!registration.is_active());

    key.set_value(2);
    rt.runtime().flush();
    assert_eq!(log.borrow().len(), 4);
}

#[test]
fn dropping_effect_handle_disposes() {
    let rt = runtime();
    let handle = rt.handle();
    let disposed = Rc::new(Cell::new(false));
    {
        let _registration = effect(&handle, || (), {
            let disposed = Rc::clone(&disposed);
            move |scope| {
                let disposed = Rc::clone(&disposed);
                scope.on_dispose(move || disposed.set(true))
            }
        });
        rt.runtime().flush();
        assert!(!disposed.get());
    }
    assert!(disposed.get());
}

#[test]
fn effect_writes_are_delivered_in_the_same_flush() {
    let rt = runtime();
    let handle = rt.handle();
    let source = mutableStateOf(&handle, 1);
    let doubled = mutableStateOf(&handle, 0);
    let observed = Rc::new(Cell::new(0));

    let _producer = effect(
        &handle,
        {
            let source = source.clone();
            move || source.value()
        },
        {
            let source = source.clone();
            let doubled = doubled.clone();
            move |_| {
                doubled.set_value(source.with_untracked(|v| *v) * 2);
                EffectResult::default()
            }
        },
    );
    let _consumer = watch(&handle, {
        let doubled = doubled.clone();
        let observed = Rc::clone(&observed);
        move || observed.set(doubled.value())
    });

    rt.runtime().flush();
    assert_eq!(observed.get(), 2);
    source.set_value(4);
    rt.runtime().flush();
    assert_eq!(observed.get(), 8);
    assert!(rt.runtime().is_idle());
}

#[test]
fn derived_state_tracks_its_inputs() {
    let rt = runtime();
    let handle = rt.handle();
    let bins = mutableStateOf(&handle, 16usize);
    let (cells, _keep) = derivedStateOf(&handle, {
        let bins = bins.clone();
        move || bins.value() * bins.value()
    });
    assert_eq!(cells.value(), 256);
    rt.runtime().flush();
    bins.set_value(4);
    rt.runtime().flush();
    assert_eq!(cells.value(), 16);
}

#[test]
fn side_effect_runs_once_on_flush() {
    let rt = runtime();
    let handle = rt.handle();
    let runs = Rc::new(Cell::new(0));
    SideEffect(&handle, {
        let runs = Rc::clone(&runs);
        move || runs.set(runs.get() + 1)
    });
    assert!(handle.has_pending_tasks());
    rt.runtime().flush();
    rt.runtime().flush();
    assert_eq!(runs.get(), 1);
}

#[test]
fn spawn_on_dead_runtime_runs_inline() {
    let handle = {
        let rt = runtime();
        rt.handle()
    };
    assert!(!handle.is_alive());
    let ran = Rc::new(Cell::new(false));
    handle.spawn_task({
        let ran = Rc::clone(&ran);
        move || ran.set(true)
    });
    assert!(ran.get());
    assert_eq!(handle.flush(), 0);
}

#[test]
fn nested_flush_from_an_effect_is_ignored() {
    let rt = runtime();
    let handle = rt.handle();
    let nested = Rc::new(Cell::new(usize::MAX));
    let _observer = watch(&handle, {
        let handle = handle.clone();
        let nested = Rc::clone(&nested);
        move || nested.set(handle.flush())
    });
    rt.runtime().flush();
    assert_eq!(nested.get(), 0);
}

#[test]
fn untracked_reads_do_not_subscribe() {
    let rt = runtime();
    let handle = rt.handle();
    let value = mutableStateOf(&handle, 0);
    let observer = watch(&handle, {
        let value = value.clone();
        move || {
            untracked(|| value.value());
        }
    });
    rt.runtime().flush();
    assert_eq!(observer.dependency_count(), 0);
    value.set_value(1);
    assert!(!handle.has_pending_effects());
}

#[test]
fn owned_take_and_replace() {
    let owned = Owned::new(Some(3));
    assert_eq!(owned.replace(Some(4)), Some(3));
    assert_eq!(owned.take(), Some(4));
    assert!(owned.with(Option::is_none));
    let alias = owned.clone();
    alias.update(|slot| *slot = Some(9));
    assert!(owned.ptr_eq(&alias));
    assert_eq!(owned.with(|slot| *slot), Some(9));
}

#[test]
fn dependency_keys_are_stable_for_equal_values() {
    assert_eq!(
        dependency_key(&(true, "heatmap", 200usize)),
        dependency_key(&(true, "heatmap", 200usize))
    );
    assert_ne!(dependency_key(&(true, 1u8)), dependency_key(&(false, 1u8)));
}
