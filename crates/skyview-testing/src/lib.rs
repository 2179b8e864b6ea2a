//! Testing utilities and harness for skyview figures

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
