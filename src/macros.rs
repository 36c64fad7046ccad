/// Extracts the successful value of a `Poll<T, E>`, returning early on
/// `NotReady` or `Err`.
#[macro_export]
macro_rules! try_ready {
    ($e:expr) => {
        match $e {
            Ok($crate::Async::Ready(t)) => t,
            Ok($crate::Async::NotReady) => return Ok($crate::Async::NotReady),
            Err(e) => return Err(From::from(e)),
        }
    };
}

/// Converts an `io::Result<T>` into the value `T`, translating
/// `ErrorKind::WouldBlock` into an early `Ok(Async::NotReady)` return.
///
/// By the byte channel contract, a `WouldBlock` error means the current
/// task has already been scheduled to be woken when the object is ready
/// again, so suspending here is sound.
#[macro_export]
macro_rules! try_nb {
    ($e:expr) => {
        match $e {
            Ok(t) => t,
            Err(ref e) if e.kind() == ::std::io::ErrorKind::WouldBlock => {
                return Ok($crate::Async::NotReady)
            }
            Err(e) => return Err(From::from(e)),
        }
    };
}
