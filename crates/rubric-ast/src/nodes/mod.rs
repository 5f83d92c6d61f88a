// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod node;
pub(crate) mod node_type;
mod shape;

pub use node::{Child, Node};
pub use node_type::NodeType;
pub use shape::{BespokeRule, Shape};
