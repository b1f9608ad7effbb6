//! Pure allocation rules for Farmstead.
//!
//! This crate holds the calculation rules that are independent of any
//! resource pool or activity tree. Functions take plain data and return
//! results, so they can be unit-tested on their own and reused by the
//! engine, the harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`labour_limits`] | Per-person / per-group labour caps, absolute or proportional |
//! | [`labour_units`] | Converting head, kg, hectares, etc. into person-days |
//! | [`timing`] | Timer rules and month arithmetic for the monthly clock |

pub mod labour_limits;
pub mod labour_units;
pub mod timing;
