pub use std::sync::{Arc, Weak};

#[cfg(feature = "parking_lot")]
pub mod parking_lot {
    /// A mutex
    #[repr(transparent)]
    #[derive(Debug, Default)]
    pub struct Mutex<T: ?Sized>(pub parking_lot::Mutex<T>);

    impl<T> Mutex<T> {
        #[must_use]
        pub fn new(value: T) -> Self {
            Self(parking_lot::Mutex::new(value))
        }
    }

    impl<T: ?Sized> Mutex<T> {
        pub fn lock(&self) -> parking_lot::MutexGuard<T> {
            self.0.lock()
        }
    }
}

#[cfg(not(feature = "parking_lot"))]
pub mod default {
    /// A mutex
    ///
    /// Poisoning is ignored: a transaction that panicked midway leaves
    /// the model in whatever state it reached.
    #[repr(transparent)]
    #[derive(Debug, Default)]
    pub struct Mutex<T: ?Sized>(pub std::sync::Mutex<T>);

    impl<T> Mutex<T> {
        #[must_use]
        pub fn new(value: T) -> Self {
            Self(std::sync::Mutex::new(value))
        }
    }

    impl<T: ?Sized> Mutex<T> {
        pub fn lock(&self) -> std::sync::MutexGuard<T> {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }
}

#[cfg(feature = "parking_lot")]
pub use self::parking_lot::Mutex;

#[cfg(not(feature = "parking_lot"))]
pub use default::Mutex;
