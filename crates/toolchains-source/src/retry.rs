//! Bounded synchronous retry.

/// Run `op` up to `attempts` times and return its first success.
///
/// `op` receives the 1-based attempt number. When every attempt fails, the
/// last error is returned. An `attempts` of zero still runs once.
pub fn with_retry<T, E, F>(attempts: usize, mut op: F) -> Result<T, E>
where
    F: FnMut(usize) -> Result<T, E>,
{
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(_) => attempt += 1,
        }
    }
}
