//! Executor scheduling behavior.

use std::cell::RefCell;
use std::rc::Rc;

use strand::future::{self, poll_fn};
use strand::prelude::*;
use strand::runtime::{Handle, Runtime};
use strand::task;
use strand::Error;

#[test]
fn ready_tasks_run_in_spawn_order() {
    let mut rt = Runtime::new().unwrap();
    let order = Rc::new(RefCell::new(Vec::new()));
    for i in 0..5 {
        let order = order.clone();
        rt.spawn(future::lazy(move || {
            order.borrow_mut().push(i);
            Ok::<(), Error>(())
        }));
    }
    rt.run_until_idle().unwrap();
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn tasks_spawned_from_tasks_run() {
    let mut rt = Runtime::new().unwrap();
    let hits = Rc::new(RefCell::new(0));
    let hits2 = hits.clone();
    rt.spawn(future::lazy(move || {
        let hits3 = hits2.clone();
        Handle::current().spawn(future::lazy(move || {
            *hits3.borrow_mut() += 1;
            Ok(())
        }));
        *hits2.borrow_mut() += 1;
        Ok::<(), Error>(())
    }));
    rt.run_until_idle().unwrap();
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn stop_breaks_the_loop_with_tasks_outstanding() {
    let mut rt = Runtime::new().unwrap();
    rt.spawn(future::lazy(|| {
        Handle::current().stop();
        Ok::<(), Error>(())
    }));
    // A task that would never complete; run() must still return.
    rt.spawn(poll_fn(|| {
        task::park();
        Ok::<Async<()>, Error>(Async::NotReady)
    }));
    rt.run().unwrap();
}

#[test]
fn self_notification_requeues_instead_of_parking() {
    let mut rt = Runtime::new().unwrap();
    let polls = Rc::new(RefCell::new(0));
    let polls2 = polls.clone();
    rt.spawn(poll_fn(move || {
        *polls2.borrow_mut() += 1;
        if *polls2.borrow() == 1 {
            // Wake ourselves while still running; the executor must
            // requeue rather than park.
            task::park().unpark();
            Ok(Async::NotReady)
        } else {
            Ok::<_, Error>(Async::Ready(()))
        }
    }));
    rt.run_until_idle().unwrap();
    assert_eq!(*polls.borrow(), 2);
}

#[test]
fn a_panicking_task_does_not_take_down_its_neighbors() {
    let mut rt = Runtime::new().unwrap();
    let survived = Rc::new(RefCell::new(false));
    let survived2 = survived.clone();
    rt.spawn(future::lazy(|| -> Result<(), Error> {
        panic!("poll gone wrong");
    }));
    rt.spawn(future::lazy(move || {
        *survived2.borrow_mut() = true;
        Ok::<(), Error>(())
    }));
    rt.run_until_idle().unwrap();
    assert!(*survived.borrow());
}

#[test]
fn task_errors_are_swallowed_at_the_boundary() {
    let mut rt = Runtime::new().unwrap();
    rt.spawn(future::err::<(), Error>(Error::Cancelled));
    rt.run_until_idle().unwrap();
}

#[test]
fn block_on_returns_the_future_outcome() {
    let mut rt = Runtime::new().unwrap();
    let value = rt.block_on(future::ok::<u32, Error>(7)).unwrap();
    assert_eq!(value, 7);
    let err = rt.block_on(future::err::<u32, Error>(Error::Cancelled));
    assert!(matches!(err, Err(Error::Cancelled)));
}

#[test]
fn block_on_drives_other_tasks_too() {
    let mut rt = Runtime::new().unwrap();
    let (tx, rx) = strand::sync::oneshot::channel();
    rt.spawn(future::lazy(move || {
        let _ = tx.send(42u32);
        Ok::<(), Error>(())
    }));
    assert_eq!(rt.block_on(rx).unwrap(), 42);
}
