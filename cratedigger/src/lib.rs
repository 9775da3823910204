// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

#![doc = include_str!("../README.md")]

mod client;
pub use self::client::{Backend, LibraryClient};

mod crates;
pub use self::crates::{CRATE_KIND_SMART, Crate, CrateDraft, CrateId, TrackSummary};

mod criteria;
pub use self::criteria::{Criteria, Match};

mod error;
pub use self::error::{Error, Result, ValidationError};

mod rule;
pub use self::rule::{Field, Operator, Rule, Shape, Value};

mod session;
pub use self::session::{BuilderSession, DEFAULT_DEBOUNCE, PreviewState, SaveState};

mod store;
pub use self::store::{CrateStore, StoreSnapshot};
