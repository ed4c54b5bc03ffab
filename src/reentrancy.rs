//! Debug-only reentrancy guard.
//!
//! The index calls user code while probing (collation hashing/equality, key
//! extraction). Entering a second public method from inside that user code
//! would observe transiently inconsistent chains. In debug builds the guard
//! panics on nested entry; in release builds it is a zero-cost no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use std::rc::Rc;

/// Per-index tracker. Guard entry points with `let _g = self.guard.enter();`.
#[derive(Debug, Default)]
pub(crate) struct Guard {
    #[cfg(debug_assertions)]
    entered: Rc<Cell<bool>>,
    // Single-threaded structure: keep !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl Guard {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            entered: Rc::new(Cell::new(false)),
            _nosend: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> Entered {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.entered.replace(true),
                "reentrant call into HashIndex during a probe"
            );
            return Entered {
                owner: Rc::clone(&self.entered),
            };
        }
        #[cfg(not(debug_assertions))]
        {
            return Entered { _z: PhantomData };
        }
    }
}

pub(crate) struct Entered {
    #[cfg(debug_assertions)]
    owner: Rc<Cell<bool>>,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<*mut ()>,
}

impl Drop for Entered {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.set(false);
    }
}
