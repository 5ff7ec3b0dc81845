// top ::= "fn" ID '(' [ID ':' type (',' ID ':' type)*] ')' ['->' type] block
//       | ["var"] ID ':=' affix ';'
// block ::= '{' term+ '}'
// term ::= if | while | ["var"] ID ':=' affix ';' | affix ';'
// if ::= "if" '(' affix ')' block "else" (block | if)
// while ::= "while" '(' affix ')' block
// affix ::= composite ['=' affix]
// composite ::= builtin (OP builtin)*
// builtin ::= basic ('.' basic | '[' affix ']' | '(' [affix (',' affix)*] ')')*
// basic ::= ID [':=' affix]
//         | INTEGER
//         | OP builtin
//         | "nil" | "true" | "false"
//         | '(' affix (',' affix)* ')'
//         | '[' affix (',' affix)* ']'
//         | if
//         | while
// type ::= atom ['->' type]
// atom ::= "Nil" | "Integer" | "Boolean" | "Character"
//        | '(' [type (',' type)*] ')'
//        | '[' type ';' INTEGER ']'
//        | '*' atom
//        | '*' '[' ']' atom

// Precedence of prefix and postfix forms
//
// . [] ()
// unary operators, & (address-of), * (value-of)
// binary operators, as registered
// =

use std::ops::Index;

use crate::{token::Location, types::TypeId, util::intern::Symbol};

/// Index of a node in its [`Ast`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The tree of a single top-level term.
///
/// Nodes are stored in an arena and refer to their children by [`NodeId`].
/// Children are always pushed before their parents, so the root is the last
/// node.
#[derive(Debug, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn push(&mut self, kind: NodeKind, loc: Location) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node { kind, loc });
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.len().checked_sub(1).map(|i| NodeId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn loc(&self, id: NodeId) -> Location {
        self[id].loc
    }

    pub(crate) fn set_loc(&mut self, id: NodeId, loc: Location) {
        self.nodes[id.index()].loc = loc;
    }

    /// Whether the node denotes a memory location, which can be assigned to
    /// or have its address taken.
    pub fn is_place(&self, id: NodeId) -> bool {
        matches!(
            self[id].kind,
            NodeKind::Variable(_)
                | NodeKind::Subscript { .. }
                | NodeKind::Dot { .. }
                | NodeKind::ValueOf(_)
        )
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

#[derive(Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Location,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Symbol,
    pub loc: Location,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeId,
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub params: Box<[Param]>,
    /// The declared return type, if any.
    pub ret: Option<TypeId>,
    pub body: NodeId,
}

#[derive(Debug, PartialEq)]
pub enum NodeKind {
    Nil,
    Boolean(bool),
    Integer(i64),
    Array(Box<[NodeId]>),
    Tuple(Box<[NodeId]>),
    Variable(Ident),
    Bind {
        name: Ident,
        /// Declared with `var`. Purely informational.
        mutable: bool,
        value: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    Binop {
        op: Ident,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unop {
        op: Ident,
        operand: NodeId,
    },
    AddressOf(NodeId),
    ValueOf(NodeId),
    IfThenElse {
        test: NodeId,
        then_arm: NodeId,
        else_arm: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    Block(Box<[NodeId]>),
    Dot {
        left: NodeId,
        right: NodeId,
    },
    Subscript {
        left: NodeId,
        index: NodeId,
    },
    Application {
        callee: NodeId,
        args: Box<[NodeId]>,
    },
    Function(Box<Function>),
}
