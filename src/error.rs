use log::Level;

/// How loudly an error is reported when it degrades a value.
///
/// A missing file is an expected answer on most hosts and stays at `debug`. Any other
/// I/O failure is unexpected and is reported at `warn`.
pub trait DegradeLevel {
    fn degrade_level(&self) -> Level {
        Level::Debug
    }
}

/// Level for an I/O failure: `debug` for not-found, `warn` otherwise.
pub fn io_level(not_found: bool) -> Level {
    if not_found { Level::Debug } else { Level::Warn }
}

impl DegradeLevel for std::io::Error {
    fn degrade_level(&self) -> Level {
        io_level(self.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Turns a fallible probe into an optional value, logging why it degraded.
///
/// Every consumer of a [`HostProbe`](crate::probe::HostProbe) goes through this so a
/// failing probe only ever costs the single field it feeds.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self, context: &str) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + DegradeLevel,
{
    fn ok_log(self, context: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(err.degrade_level(), "{context}: {err}");
                None
            }
        }
    }
}
