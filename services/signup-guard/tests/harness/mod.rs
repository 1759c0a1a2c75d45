// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for signup abuse simulation.
//!
//! This module provides utilities for replaying abusive signup traffic
//! against the guard under a simulated clock.

pub mod attacks;
pub mod generators;
pub mod metrics;
