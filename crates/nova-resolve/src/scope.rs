//! Lexical scope chain threaded through a traversal.
//!
//! The chain is an explicit stack: callers remember [`Scope::depth`] before
//! entering a construct and [`Scope::truncate`] back to it afterwards, so a
//! skipped subtree can never leave frames behind.

use std::collections::HashMap;

use nova_syntax::ast::{MemberDecl, TypeDecl, TypeParam};

use crate::types::{Resolution, ResolvedType};

#[derive(Debug, Clone)]
pub enum ClassKind<'a> {
    Named(&'a TypeDecl),
    Anonymous {
        members: &'a [MemberDecl],
        /// The instantiated class or interface.
        super_type: Option<ResolvedType>,
    },
}

#[derive(Debug, Clone)]
pub struct ClassFrame<'a> {
    /// Qualified name; anonymous classes use `{outer}$anonymous`.
    pub name: String,
    pub kind: ClassKind<'a>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockFrame {
    pub(crate) locals: HashMap<String, Resolution<ResolvedType>>,
    pub(crate) local_types: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub enum Frame<'a> {
    Class(ClassFrame<'a>),
    /// Method or constructor type parameters.
    TypeParams(&'a [TypeParam]),
    Block(BlockFrame),
}

#[derive(Debug, Clone)]
pub struct Scope<'a> {
    unit: usize,
    frames: Vec<Frame<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(unit: usize) -> Self {
        Self {
            unit,
            frames: Vec::new(),
        }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn push_class(&mut self, name: impl Into<String>, kind: ClassKind<'a>) {
        self.frames.push(Frame::Class(ClassFrame {
            name: name.into(),
            kind,
        }));
    }

    pub fn push_type_params(&mut self, params: &'a [TypeParam]) {
        if !params.is_empty() {
            self.frames.push(Frame::TypeParams(params));
        }
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame::Block(BlockFrame::default()));
    }

    fn with_block(&mut self, f: impl FnOnce(&mut BlockFrame)) {
        if let Some(Frame::Block(block)) = self.frames.last_mut() {
            f(block);
            return;
        }
        let mut block = BlockFrame::default();
        f(&mut block);
        self.frames.push(Frame::Block(block));
    }

    /// Declares a local in the innermost block, opening one when the top
    /// frame is not a block.
    pub fn declare_local(&mut self, name: impl Into<String>, ty: Resolution<ResolvedType>) {
        let name = name.into();
        self.with_block(|block| {
            block.locals.insert(name, ty);
        });
    }

    pub fn declare_local_type(&mut self, name: impl Into<String>, qualified: impl Into<String>) {
        let (name, qualified) = (name.into(), qualified.into());
        self.with_block(|block| {
            block.local_types.insert(name, qualified);
        });
    }

    pub fn frames(&self) -> impl DoubleEndedIterator<Item = &Frame<'a>> {
        self.frames.iter()
    }

    /// Innermost class, named or anonymous.
    pub fn current_class(&self) -> Option<&ClassFrame<'a>> {
        self.classes().next()
    }

    /// Class frames from the innermost outwards.
    pub fn classes(&self) -> impl Iterator<Item = &ClassFrame<'a>> {
        self.frames.iter().rev().filter_map(|frame| match frame {
            Frame::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Innermost named class; anonymous classes are skipped.
    pub fn current_named_class(&self) -> Option<(&str, &'a TypeDecl)> {
        self.classes().find_map(|class| match class.kind {
            ClassKind::Named(decl) => Some((class.name.as_str(), decl)),
            ClassKind::Anonymous { .. } => None,
        })
    }
}
