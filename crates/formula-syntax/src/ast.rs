//! Formula syntax tree.
//!
//! Only the start/end positions that cannot be derived from children are stored. Everything
//! else is computed by [`Spanned`].

use crate::position::{Pos, Span, NO_POS};
use crate::token::Token;
use serde::{Deserialize, Serialize};

/// Source extent of a node.
pub trait Spanned {
    /// Position of the first character belonging to the node.
    fn pos(&self) -> Pos;

    /// Position of the first character immediately after the node.
    fn end(&self) -> Pos;

    /// 0-based byte span of the node.
    fn span(&self) -> Span {
        Span::from_pos(self.pos(), self.end())
    }
}

/// Placeholder for an expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadExpr {
    pub from: Pos,
    pub to: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name_pos: Pos,
    pub name: String,
}

/// Literal of a value kind (`INT`, `FLOAT`, `IMAG`, `STRING`, `REF` or `RNG`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicLit {
    pub value_pos: Pos,
    pub kind: Token,
    /// Raw source text, e.g. `42`, `"a""b"`, `A1:D3`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParenExpr {
    pub lparen: Pos,
    pub x: Box<Expr>,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub lparen: Pos,
    pub args: Vec<Expr>,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op_pos: Pos,
    pub op: Token,
    pub x: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub x: Box<Expr>,
    pub op_pos: Pos,
    pub op: Token,
    pub y: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Bad(BadExpr),
    Ident(Ident),
    BasicLit(BasicLit),
    Paren(ParenExpr),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

impl Expr {
    #[must_use]
    pub fn bad(from: Pos, to: Pos) -> Self {
        Expr::Bad(BadExpr { from, to })
    }

    #[must_use]
    pub fn is_bad(&self) -> bool {
        matches!(self, Expr::Bad(_))
    }

    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = paren.x.as_ref();
        }
        expr
    }
}

/// A parameter-style grouping entry: optional names, a type expression and an optional tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<BasicLit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldList {
    pub opening: Pos,
    pub list: Vec<Field>,
    pub closing: Pos,
}

impl FieldList {
    /// Number of parameters: each name counts once, an unnamed field counts as one.
    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.list.iter().map(|f| f.names.len().max(1)).sum()
    }
}

impl Spanned for BadExpr {
    fn pos(&self) -> Pos {
        self.from
    }

    fn end(&self) -> Pos {
        self.to
    }
}

impl Spanned for Ident {
    fn pos(&self) -> Pos {
        self.name_pos
    }

    fn end(&self) -> Pos {
        self.name_pos + self.name.len()
    }
}

impl Spanned for BasicLit {
    fn pos(&self) -> Pos {
        self.value_pos
    }

    fn end(&self) -> Pos {
        self.value_pos + self.value.len()
    }
}

impl Spanned for ParenExpr {
    fn pos(&self) -> Pos {
        self.lparen
    }

    fn end(&self) -> Pos {
        self.rparen + 1
    }
}

impl Spanned for CallExpr {
    fn pos(&self) -> Pos {
        self.fun.pos()
    }

    fn end(&self) -> Pos {
        self.rparen + 1
    }
}

impl Spanned for UnaryExpr {
    fn pos(&self) -> Pos {
        self.op_pos
    }

    fn end(&self) -> Pos {
        self.x.end()
    }
}

impl Spanned for BinaryExpr {
    fn pos(&self) -> Pos {
        self.x.pos()
    }

    fn end(&self) -> Pos {
        self.y.end()
    }
}

impl Spanned for Expr {
    fn pos(&self) -> Pos {
        match self {
            Expr::Bad(x) => x.pos(),
            Expr::Ident(x) => x.pos(),
            Expr::BasicLit(x) => x.pos(),
            Expr::Paren(x) => x.pos(),
            Expr::Call(x) => x.pos(),
            Expr::Unary(x) => x.pos(),
            Expr::Binary(x) => x.pos(),
        }
    }

    fn end(&self) -> Pos {
        match self {
            Expr::Bad(x) => x.end(),
            Expr::Ident(x) => x.end(),
            Expr::BasicLit(x) => x.end(),
            Expr::Paren(x) => x.end(),
            Expr::Call(x) => x.end(),
            Expr::Unary(x) => x.end(),
            Expr::Binary(x) => x.end(),
        }
    }
}

impl Spanned for Field {
    fn pos(&self) -> Pos {
        match self.names.first() {
            Some(name) => name.pos(),
            None => self.ty.pos(),
        }
    }

    fn end(&self) -> Pos {
        match &self.tag {
            Some(tag) => tag.end(),
            None => self.ty.end(),
        }
    }
}

impl Spanned for FieldList {
    fn pos(&self) -> Pos {
        if self.opening.is_valid() {
            return self.opening;
        }
        self.list.first().map_or(NO_POS, Spanned::pos)
    }

    fn end(&self) -> Pos {
        if self.closing.is_valid() {
            return self.closing + 1;
        }
        self.list.last().map_or(NO_POS, Spanned::end)
    }
}

/// Borrowed view over any syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    Expr(&'a Expr),
    /// A name declared by a [`Field`].
    Name(&'a Ident),
    /// The tag literal of a [`Field`].
    Tag(&'a BasicLit),
    Field(&'a Field),
    FieldList(&'a FieldList),
}

impl<'a> From<&'a Expr> for Node<'a> {
    fn from(expr: &'a Expr) -> Self {
        Node::Expr(expr)
    }
}

impl<'a> From<&'a Field> for Node<'a> {
    fn from(field: &'a Field) -> Self {
        Node::Field(field)
    }
}

impl<'a> From<&'a FieldList> for Node<'a> {
    fn from(list: &'a FieldList) -> Self {
        Node::FieldList(list)
    }
}

impl Spanned for Node<'_> {
    fn pos(&self) -> Pos {
        match self {
            Node::Expr(x) => x.pos(),
            Node::Name(x) => x.pos(),
            Node::Tag(x) => x.pos(),
            Node::Field(x) => x.pos(),
            Node::FieldList(x) => x.pos(),
        }
    }

    fn end(&self) -> Pos {
        match self {
            Node::Expr(x) => x.end(),
            Node::Name(x) => x.end(),
            Node::Tag(x) => x.end(),
            Node::Field(x) => x.end(),
            Node::FieldList(x) => x.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(pos: usize, kind: Token, value: &str) -> Expr {
        Expr::BasicLit(BasicLit {
            value_pos: Pos(pos),
            kind,
            value: value.to_string(),
        })
    }

    fn ident(pos: usize, name: &str) -> Ident {
        Ident {
            name_pos: Pos(pos),
            name: name.to_string(),
        }
    }

    #[test]
    fn leaf_ends_follow_text_length() {
        assert_eq!(Expr::Ident(ident(3, "SUM")).end(), Pos(6));
        assert_eq!(lit(1, Token::Rng, "A1:D3").end(), Pos(6));
        assert_eq!(Expr::bad(Pos(2), Pos(5)).span(), Span::new(1, 4));
    }

    #[test]
    fn aggregate_positions() {
        // SUM(1, 2)
        let call = Expr::Call(CallExpr {
            fun: Box::new(Expr::Ident(ident(1, "SUM"))),
            lparen: Pos(4),
            args: vec![lit(5, Token::Int, "1"), lit(8, Token::Int, "2")],
            rparen: Pos(9),
        });
        assert_eq!((call.pos(), call.end()), (Pos(1), Pos(10)));

        // -(1+2)
        let binary = Expr::Binary(BinaryExpr {
            x: Box::new(lit(3, Token::Int, "1")),
            op_pos: Pos(4),
            op: Token::Add,
            y: Box::new(lit(5, Token::Int, "2")),
        });
        assert_eq!((binary.pos(), binary.end()), (Pos(3), Pos(6)));
        let paren = Expr::Paren(ParenExpr {
            lparen: Pos(2),
            x: Box::new(binary),
            rparen: Pos(6),
        });
        assert_eq!((paren.pos(), paren.end()), (Pos(2), Pos(7)));
        let unary = Expr::Unary(UnaryExpr {
            op_pos: Pos(1),
            op: Token::Sub,
            x: Box::new(paren),
        });
        assert_eq!((unary.pos(), unary.end()), (Pos(1), Pos(7)));
        assert_eq!(unary.span(), Span::new(0, 6));
    }

    #[test]
    fn unparen_strips_nested_parens() {
        let inner = lit(3, Token::Int, "7");
        let wrapped = Expr::Paren(ParenExpr {
            lparen: Pos(1),
            x: Box::new(Expr::Paren(ParenExpr {
                lparen: Pos(2),
                x: Box::new(inner.clone()),
                rparen: Pos(4),
            })),
            rparen: Pos(5),
        });
        assert_eq!(wrapped.unparen(), &inner);
        assert_eq!(inner.unparen(), &inner);
    }

    #[test]
    fn field_positions_and_counts() {
        let named = Field {
            names: vec![ident(2, "a"), ident(5, "b")],
            ty: Expr::Ident(ident(7, "INT")),
            tag: Some(BasicLit {
                value_pos: Pos(11),
                kind: Token::String,
                value: "\"t\"".to_string(),
            }),
        };
        assert_eq!((named.pos(), named.end()), (Pos(2), Pos(14)));

        let unnamed = Field {
            names: Vec::new(),
            ty: lit(16, Token::Ref, "A1"),
            tag: None,
        };
        assert_eq!((unnamed.pos(), unnamed.end()), (Pos(16), Pos(18)));

        let mut list = FieldList {
            opening: Pos(1),
            list: vec![named, unnamed],
            closing: Pos(18),
        };
        assert_eq!(list.num_fields(), 3);
        assert_eq!((list.pos(), list.end()), (Pos(1), Pos(19)));

        list.opening = NO_POS;
        list.closing = NO_POS;
        assert_eq!((list.pos(), list.end()), (Pos(2), Pos(18)));

        let empty = FieldList::default();
        assert_eq!((empty.pos(), empty.end()), (NO_POS, NO_POS));
        assert_eq!(empty.num_fields(), 0);
    }

    #[test]
    fn node_view_delegates() {
        let expr = lit(4, Token::Float, "1.5");
        let node = Node::from(&expr);
        assert_eq!((node.pos(), node.end()), (Pos(4), Pos(7)));
    }
}
