//! Output buffers for the printer.
//!
//! Sinks implement [`fmt::Write`] so the printer and number formatting can share one code path.
//! A sink that cannot take more output records why and reports a plain [`fmt::Error`].
use core::fmt;

use crate::{hooks::Hooks, Error};

/// A heap buffer whose capacity is charged to the allocator hooks while it is alive.
pub(crate) struct Growable<'h> {
    buffer: String,
    capacity: usize,
    grow: bool,
    hooks: &'h dyn Hooks,
    pub(crate) failure: Option<Error>,
}

impl<'h> Growable<'h> {
    pub(crate) fn new(hooks: &'h dyn Hooks, capacity: usize, grow: bool) -> Result<Self, Error> {
        if !hooks.allocate(capacity) {
            return Err(Error::Allocation {
                requested: capacity,
            });
        }
        let mut buffer = String::new();
        if buffer.try_reserve_exact(capacity).is_err() {
            hooks.free(capacity);
            return Err(Error::Allocation {
                requested: capacity,
            });
        }
        Ok(Growable {
            buffer,
            capacity,
            grow,
            hooks,
            failure: None,
        })
    }

    fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self
            .buffer
            .len()
            .checked_add(additional)
            .ok_or(Error::Allocation {
                requested: usize::MAX,
            })?;
        if needed <= self.capacity {
            return Ok(());
        }
        if !self.grow {
            log::trace!("Print buffer of {} bytes is exhausted", self.capacity);
            return Err(Error::BufferFull {
                capacity: self.capacity,
            });
        }
        let new_capacity = needed.max(self.capacity.saturating_mul(2));
        let delta = new_capacity - self.capacity;
        if !self.hooks.allocate(delta) {
            return Err(Error::Allocation { requested: delta });
        }
        if self
            .buffer
            .try_reserve_exact(new_capacity - self.buffer.len())
            .is_err()
        {
            self.hooks.free(delta);
            return Err(Error::Allocation { requested: delta });
        }
        self.capacity = new_capacity;
        Ok(())
    }

    pub(crate) fn into_string(mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl fmt::Write for Growable<'_> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        match self.reserve(text.len()) {
            Ok(()) => {
                self.buffer.push_str(text);
                Ok(())
            }
            Err(error) => {
                self.failure = Some(error);
                Err(fmt::Error)
            }
        }
    }
}

impl Drop for Growable<'_> {
    fn drop(&mut self) {
        self.hooks.free(self.capacity);
    }
}

/// A caller-provided buffer that is never written past its end.
pub(crate) struct Fixed<'b> {
    buffer: &'b mut [u8],
    pub(crate) len: usize,
    pub(crate) failure: Option<Error>,
}

impl<'b> Fixed<'b> {
    pub(crate) fn new(buffer: &'b mut [u8]) -> Self {
        Fixed {
            buffer,
            len: 0,
            failure: None,
        }
    }
}

impl fmt::Write for Fixed<'_> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        let end = self.len + text.len();
        if let Some(target) = self.buffer.get_mut(self.len..end) {
            target.copy_from_slice(text.as_bytes());
            self.len = end;
            Ok(())
        } else {
            log::trace!("Preallocated buffer of {} bytes is exhausted", self.buffer.len());
            self.failure = Some(Error::BufferFull {
                capacity: self.buffer.len(),
            });
            Err(fmt::Error)
        }
    }
}
