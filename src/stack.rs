//! Persistent, structurally shared LIFO stacks.
//!
//! Nodes live in a [`StackArena`] and are addressed by index. A [`Stack`] is a
//! cheap `Copy` handle to one node (or to nothing, the empty stack). Pushing
//! allocates a node that points at the previous handle, so any number of
//! handles may share a tail safely; popping just moves to the tail handle.
//!
//! [`VirtualStack`] bundles an arena with a mutable cursor. The engine uses
//! one for the call stack of execution scopes and another for history.

use crate::error::StackError;

/// Index of a node inside a [`StackArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node<T> {
    head: T,
    tail: Option<NodeId>,
}

/// Backing storage for persistent stack nodes. Nodes are never freed.
#[derive(Debug, Clone)]
pub struct StackArena<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Default for StackArena<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> StackArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, head: T, tail: Option<NodeId>) -> NodeId {
        self.nodes.push(Node { head, tail });
        NodeId(self.nodes.len() - 1)
    }
}

/// A handle to an immutable chain of nodes. `Stack::EMPTY` is the empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stack {
    top: Option<NodeId>,
}

impl Stack {
    pub const EMPTY: Stack = Stack { top: None };

    pub fn is_empty(self) -> bool {
        self.top.is_none()
    }

    /// Returns a new handle whose head is `value` and whose tail is `self`.
    pub fn push<T>(self, arena: &mut StackArena<T>, value: T) -> Stack {
        Stack {
            top: Some(arena.alloc(value, self.top)),
        }
    }

    /// Returns the tail of this stack.
    pub fn pop<T>(self, arena: &StackArena<T>) -> Result<Stack, StackError> {
        let id = self.top.ok_or(StackError::EmptyStack)?;
        Ok(Stack {
            top: arena.nodes[id.0].tail,
        })
    }

    pub fn head<T>(self, arena: &StackArena<T>) -> Result<&T, StackError> {
        let id = self.top.ok_or(StackError::EmptyStack)?;
        Ok(&arena.nodes[id.0].head)
    }

    /// Returns a handle with the head replaced by `value` and the same tail.
    ///
    /// The old node is left untouched, so other handles that reference it keep
    /// seeing the old head. Updating the empty stack pushes `value`.
    pub fn update<T>(self, arena: &mut StackArena<T>, value: T) -> Stack {
        let tail = self.top.and_then(|id| arena.nodes[id.0].tail);
        Stack {
            top: Some(arena.alloc(value, tail)),
        }
    }

    /// Iterates the values from head to bottom.
    pub fn iter<T>(self, arena: &StackArena<T>) -> StackIter<'_, T> {
        StackIter {
            arena,
            next: self.top,
        }
    }

    pub fn depth<T>(self, arena: &StackArena<T>) -> usize {
        self.iter(arena).count()
    }
}

pub struct StackIter<'a, T> {
    arena: &'a StackArena<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for StackIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.arena.nodes[id.0];
        self.next = node.tail;
        Some(&node.head)
    }
}

/// A mutable cursor over a persistent stack.
#[derive(Debug, Clone)]
pub struct VirtualStack<T> {
    arena: StackArena<T>,
    cursor: Stack,
}

impl<T> Default for VirtualStack<T> {
    fn default() -> Self {
        Self {
            arena: StackArena::new(),
            cursor: Stack::EMPTY,
        }
    }
}

impl<T> VirtualStack<T> {
    /// Creates an empty virtual stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a virtual stack holding a single value.
    pub fn with_head(value: T) -> Self {
        let mut stack = Self::new();
        stack.push(value);
        stack
    }

    pub fn get_head(&self) -> Result<&T, StackError> {
        self.cursor.head(&self.arena)
    }

    pub fn push(&mut self, value: T) {
        self.cursor = self.cursor.push(&mut self.arena, value);
    }

    pub fn pop(&mut self) -> Result<(), StackError> {
        self.cursor = self.cursor.pop(&self.arena)?;
        Ok(())
    }

    pub fn update(&mut self, value: T) {
        self.cursor = self.cursor.update(&mut self.arena, value);
    }

    /// Returns the current cursor handle.
    pub fn get(&self) -> Stack {
        self.cursor
    }

    /// Moves the cursor to a handle previously returned by [`VirtualStack::get`].
    pub fn set(&mut self, stack: Stack) {
        self.cursor = stack;
    }

    pub fn iter(&self) -> StackIter<'_, T> {
        self.cursor.iter(&self.arena)
    }

    pub fn depth(&self) -> usize {
        self.cursor.depth(&self.arena)
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    pub fn arena(&self) -> &StackArena<T> {
        &self.arena
    }
}
