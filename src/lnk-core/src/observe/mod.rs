// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Observable state: typed cells, weak listeners and the transition log.

pub mod cell;
pub mod listener;
pub mod record;

pub use cell::ObservableCell;
pub use listener::{ListenerId, StateListener};
pub use record::{StateLog, StateRecord};
