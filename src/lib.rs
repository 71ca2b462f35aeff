#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

extern crate alloc;

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;

mod cumulative;
pub use cumulative::CumulativeWindow;

mod paired_cumulative;
pub use paired_cumulative::PairedCumulativeWindow;

mod sliding_extremum;
pub use sliding_extremum::SlidingExtremum;

mod order_statistics;
pub use order_statistics::OrderStatisticWindow;
