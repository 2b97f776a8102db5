//! Depth-first traversal of the syntax tree.

use crate::ast::{Expr, Node};

/// What [`walk`] should do after [`Visitor::enter`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the children, then call [`Visitor::leave`] for this node.
    Children,
    /// Skip the children and do not call [`Visitor::leave`].
    Skip,
}

pub trait Visitor<'a> {
    fn enter(&mut self, node: Node<'a>) -> Walk;

    fn leave(&mut self, _node: Node<'a>) {}
}

/// Traverses `node` depth-first.
///
/// Children are visited in source order: left operand before right, function before arguments,
/// names before type before tag.
pub fn walk<'a, V>(visitor: &mut V, node: Node<'a>)
where
    V: Visitor<'a> + ?Sized,
{
    if visitor.enter(node) == Walk::Skip {
        return;
    }

    match node {
        Node::Expr(expr) => match expr {
            Expr::Bad(_) | Expr::Ident(_) | Expr::BasicLit(_) => {}
            Expr::Paren(paren) => walk(visitor, Node::Expr(&paren.x)),
            Expr::Unary(unary) => walk(visitor, Node::Expr(&unary.x)),
            Expr::Binary(binary) => {
                walk(visitor, Node::Expr(&binary.x));
                walk(visitor, Node::Expr(&binary.y));
            }
            Expr::Call(call) => {
                walk(visitor, Node::Expr(&call.fun));
                for arg in &call.args {
                    walk(visitor, Node::Expr(arg));
                }
            }
        },
        Node::Name(_) | Node::Tag(_) => {}
        Node::Field(field) => {
            for name in &field.names {
                walk(visitor, Node::Name(name));
            }
            walk(visitor, Node::Expr(&field.ty));
            if let Some(tag) = &field.tag {
                walk(visitor, Node::Tag(tag));
            }
        }
        Node::FieldList(list) => {
            for field in &list.list {
                walk(visitor, Node::Field(field));
            }
        }
    }

    visitor.leave(node);
}

struct Inspector<F>(F);

impl<'a, F> Visitor<'a> for Inspector<F>
where
    F: FnMut(Node<'a>) -> bool,
{
    fn enter(&mut self, node: Node<'a>) -> Walk {
        if (self.0)(node) {
            Walk::Children
        } else {
            Walk::Skip
        }
    }
}

/// Calls `f` for every node in depth-first order. Returning `false` skips the node's children.
pub fn inspect<'a, F>(node: Node<'a>, f: F)
where
    F: FnMut(Node<'a>) -> bool,
{
    walk(&mut Inspector(f), node);
}
