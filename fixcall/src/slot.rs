use std::{fmt::Debug, marker::PhantomData, mem, mem::MaybeUninit, ptr};

/// Number of machine words reserved for an erased method or function pointer.
///
/// Every Rust function pointer is a single word wide.
pub const METHOD_SLOT_WORDS: usize = 1;

/// Fixed-size opaque storage for a bound method or context function.
///
/// The slot does not know which type it holds. It is always paired with a
/// trampoline that was monomorphized for the very same type, and that
/// trampoline is the only code reading the slot back.
#[derive(Clone, Copy)]
pub(crate) struct MethodSlot {
    words: [MaybeUninit<usize>; METHOD_SLOT_WORDS],
}

/// Post-monomorphization check that `M` fits in a [`MethodSlot`].
struct Fits<M>(PhantomData<M>);

impl<M> Fits<M> {
    const OK: () = assert!(
        mem::size_of::<M>() <= mem::size_of::<MethodSlot>()
            && mem::align_of::<M>() <= mem::align_of::<MethodSlot>(),
        "method encoding does not fit in the callback slot"
    );
}

impl MethodSlot {
    pub(crate) const fn zeroed() -> MethodSlot {
        Self {
            words: [MaybeUninit::new(0); METHOD_SLOT_WORDS],
        }
    }

    /// Store `value`, overwriting whatever the slot held before.
    ///
    /// Types that do not fit the slot are rejected at compile time.
    pub(crate) fn store<M: Copy>(&mut self, value: M) {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<M>::OK;

        // SAFETY: `M` fits in `words` (checked above) and `words` is aligned
        // for `M`. `M: Copy`, so overwriting never skips a destructor.
        unsafe {
            ptr::write(self.words.as_mut_ptr().cast::<M>(), value);
        }
    }

    /// Read the slot back as an `M`.
    ///
    /// # Safety
    ///
    /// The last call to [`MethodSlot::store`] must have been made with the same
    /// type `M`.
    pub(crate) unsafe fn load<M: Copy>(&self) -> M {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<M>::OK;

        ptr::read(self.words.as_ptr().cast::<M>())
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::zeroed();
    }
}

impl Default for MethodSlot {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Debug for MethodSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSlot")
            .field("words", &METHOD_SLOT_WORDS)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_exactly_one_function_pointer_wide() {
        assert_eq!(mem::size_of::<MethodSlot>(), mem::size_of::<fn()>());
        assert_eq!(
            mem::size_of::<MethodSlot>(),
            mem::size_of::<fn(&mut String, u64, &str) -> Vec<u8>>()
        );
    }

    #[test]
    fn loads_back_the_stored_function() {
        fn double(n: &mut i32, by: i32) -> i32 {
            *n *= by;
            *n
        }

        let mut slot = MethodSlot::zeroed();
        slot.store(double as fn(&mut i32, i32) -> i32);

        let function = unsafe { slot.load::<fn(&mut i32, i32) -> i32>() };
        let mut n = 21;
        assert_eq!(function(&mut n, 2), 42);
        assert_eq!(n, 42);
    }

    #[test]
    fn clear_zeroes_every_word() {
        let mut slot = MethodSlot::zeroed();
        slot.store((|| 7) as fn() -> u8);
        slot.clear();

        assert_eq!(unsafe { slot.load::<usize>() }, 0);
    }
}
