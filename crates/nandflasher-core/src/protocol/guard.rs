//! Scoped write-protect release

use core::ops::{Deref, DerefMut};

use crate::bus::NandBus;

/// Releases write protection for its lifetime
///
/// Protection is restored when the guard is dropped, including on early
/// returns through `?`.
pub struct WriteEnableGuard<'a, B: NandBus + ?Sized> {
    bus: &'a mut B,
}

impl<'a, B: NandBus + ?Sized> WriteEnableGuard<'a, B> {
    /// Deassert write protect on `bus`
    pub fn new(bus: &'a mut B) -> Self {
        bus.set_write_protect(false);
        Self { bus }
    }
}

impl<B: NandBus + ?Sized> Deref for WriteEnableGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bus
    }
}

impl<B: NandBus + ?Sized> DerefMut for WriteEnableGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: NandBus + ?Sized> Drop for WriteEnableGuard<'_, B> {
    fn drop(&mut self) {
        self.bus.set_write_protect(true);
    }
}
