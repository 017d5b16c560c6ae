//! Mutation log.

use filament_spool::CompactString;

use crate::node::NodeId;

/// Kind of adapter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateElement,
    CreateText,
    SetProperty,
    RemoveProperty,
    AppendChild,
    RemoveChild,
    SetText,
}

/// One adapter call as it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: CompactString },
    CreateText { node: NodeId, text: CompactString },
    SetProperty { node: NodeId, key: CompactString },
    RemoveProperty { node: NodeId, key: CompactString },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    SetText { node: NodeId, text: CompactString },
}

impl Mutation {
    /// Kind of call.
    pub fn op(&self) -> Op {
        match self {
            Mutation::CreateElement { .. } => Op::CreateElement,
            Mutation::CreateText { .. } => Op::CreateText,
            Mutation::SetProperty { .. } => Op::SetProperty,
            Mutation::RemoveProperty { .. } => Op::RemoveProperty,
            Mutation::AppendChild { .. } => Op::AppendChild,
            Mutation::RemoveChild { .. } => Op::RemoveChild,
            Mutation::SetText { .. } => Op::SetText,
        }
    }
}
