// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure for AST traversal.

mod dispatch;
mod traits;

pub use dispatch::{walk, walk_all, walk_children};
pub use traits::{dispatch, Visitor};
