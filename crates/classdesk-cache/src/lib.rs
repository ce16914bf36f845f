//! Client-side entity cache for Classdesk.
//!
//! One [`EntityCache`] per client holds a [`Mirror`] of every remote
//! collection (profiles, teachers, students, bookings, payrolls, leave
//! requests). It is loaded lazily on the first protected navigation and
//! written through on every mutation.
//!
//! # Key types
//!
//! - [`EntityCache`]: load, refresh, mutate, invalidate
//! - [`Mirror`]: the collections themselves, cloneable as a snapshot
//! - [`TeacherProfile`], [`StudentProfile`], [`BookingView`]: joins
//!   computed from the mirror on read
//! - [`CacheError`]: refresh and mutation failures

mod cache;
mod error;
mod mirror;
mod views;

pub use cache::EntityCache;
pub use error::CacheError;
pub use mirror::Mirror;
pub use views::{BookingView, StudentProfile, TeacherProfile};
