//! XPath evaluation over a [`Document`].

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::{Value, XNode};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct Context {
    node: XNode,
    position: usize,
    size: usize,
}

pub(crate) struct Evaluator<'a> {
    doc: &'a Document,
    /// Pre-order rank of every attached node, indexed by arena slot.
    order: Vec<usize>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(doc: &'a Document) -> Self {
        let mut order = vec![usize::MAX; doc.len()];
        order[doc.root().index()] = 0;
        for (rank, id) in doc.descendants(doc.root()).enumerate() {
            order[id.index()] = rank + 1;
        }
        Self { doc, order }
    }

    pub(crate) fn evaluate(&self, expr: &Expr, context: NodeId) -> Result<Value> {
        let ctx = Context {
            node: XNode::Node(context),
            position: 1,
            size: 1,
        };
        self.eval(expr, ctx)
    }

    fn key(&self, node: XNode) -> (usize, usize) {
        match node {
            XNode::Node(id) => (self.order[id.index()], 0),
            XNode::Attribute(id, i) => (self.order[id.index()], i + 1),
        }
    }

    fn sort_unique(&self, nodes: &mut Vec<XNode>) {
        nodes.sort_by_key(|&n| self.key(n));
        nodes.dedup();
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> Result<Value> {
        match expr {
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Negate(inner) => Ok(Value::Number(-self.number(&self.eval(inner, ctx)?))),
            Expr::Union(left, right) => {
                let mut nodes = self.eval_nodes(left, ctx)?;
                nodes.extend(self.eval_nodes(right, ctx)?);
                self.sort_unique(&mut nodes);
                Ok(Value::NodeSet(nodes))
            }
            Expr::Binary(op, left, right) => self.eval_binary(*op, left, right, ctx),
            Expr::Function(name, args) => self.call(name, args, ctx),
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    XNode::Node(self.doc.root())
                } else {
                    ctx.node
                };
                Ok(Value::NodeSet(self.walk(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let mut nodes = self.eval_nodes(primary, ctx)?;
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(Value::NodeSet(self.walk(nodes, steps)?))
            }
        }
    }

    fn eval_nodes(&self, expr: &Expr, ctx: Context) -> Result<Vec<XNode>> {
        match self.eval(expr, ctx)? {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(Error::InvalidXPath(format!(
                "expected a node-set, got {other:?}"
            ))),
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr, ctx: Context) -> Result<Value> {
        match op {
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?;
                if self.boolean(&l) {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.boolean(&self.eval(right, ctx)?)))
            }
            BinaryOp::And => {
                let l = self.eval(left, ctx)?;
                if !self.boolean(&l) {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.boolean(&self.eval(right, ctx)?)))
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(op, &l, &r)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.number(&self.eval(left, ctx)?);
                let r = self.number(&self.eval(right, ctx)?);
                Ok(Value::Number(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    _ => l % r,
                }))
            }
        }
    }

    // === Location steps ===

    fn walk(&self, mut nodes: Vec<XNode>, steps: &[Step]) -> Result<Vec<XNode>> {
        for step in steps {
            let mut next = Vec::new();
            for &node in &nodes {
                let mut candidates: Vec<XNode> = self
                    .axis(node, step.axis)
                    .into_iter()
                    .filter(|&n| self.test(n, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate)?;
                }
                next.extend(candidates);
            }
            self.sort_unique(&mut next);
            nodes = next;
        }
        Ok(nodes)
    }

    fn filter(&self, nodes: Vec<XNode>, predicate: &Expr) -> Result<Vec<XNode>> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, ctx)? {
                Value::Number(n) => (i + 1) as f64 == n,
                other => self.boolean(&other),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Nodes along an axis in proximity order.
    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let doc = self.doc;
        let id = match node {
            XNode::Node(id) => id,
            XNode::Attribute(owner, _) => {
                return match axis {
                    Axis::SelfAxis => vec![node],
                    Axis::Parent => vec![XNode::Node(owner)],
                    Axis::Ancestor | Axis::AncestorOrSelf => {
                        let mut out = Vec::new();
                        if axis == Axis::AncestorOrSelf {
                            out.push(node);
                        }
                        out.push(XNode::Node(owner));
                        out.extend(doc.ancestors(owner).map(XNode::Node));
                        out
                    }
                    Axis::Following => {
                        let mut out: Vec<XNode> = doc.descendants(owner).map(XNode::Node).collect();
                        out.extend(self.axis(XNode::Node(owner), Axis::Following));
                        out
                    }
                    Axis::Preceding => self.axis(XNode::Node(owner), Axis::Preceding),
                    _ => Vec::new(),
                };
            }
        };

        match axis {
            Axis::Child => doc.children(id).iter().copied().map(XNode::Node).collect(),
            Axis::Descendant => doc.descendants(id).map(XNode::Node).collect(),
            Axis::DescendantOrSelf => std::iter::once(id)
                .chain(doc.descendants(id))
                .map(XNode::Node)
                .collect(),
            Axis::SelfAxis => vec![node],
            Axis::Parent => doc.parent(id).map(XNode::Node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(id).map(XNode::Node).collect(),
            Axis::AncestorOrSelf => std::iter::once(id)
                .chain(doc.ancestors(id))
                .map(XNode::Node)
                .collect(),
            Axis::FollowingSibling => doc.following_siblings(id).into_iter().map(XNode::Node).collect(),
            Axis::PrecedingSibling => doc.preceding_siblings(id).into_iter().map(XNode::Node).collect(),
            Axis::Following => {
                let mut out = Vec::new();
                for current in std::iter::once(id).chain(doc.ancestors(id)) {
                    for sibling in doc.following_siblings(current) {
                        out.push(XNode::Node(sibling));
                        out.extend(doc.descendants(sibling).map(XNode::Node));
                    }
                }
                out
            }
            Axis::Preceding => {
                let mut out = Vec::new();
                for current in std::iter::once(id).chain(doc.ancestors(id)) {
                    for sibling in doc.preceding_siblings(current) {
                        let mut subtree: Vec<XNode> = std::iter::once(sibling)
                            .chain(doc.descendants(sibling))
                            .map(XNode::Node)
                            .collect();
                        subtree.reverse();
                        out.extend(subtree);
                    }
                }
                out
            }
            Axis::Attribute => (0..doc.attrs(id).len())
                .map(|i| XNode::Attribute(id, i))
                .collect(),
        }
    }

    fn test(&self, node: XNode, test: &NodeTest) -> bool {
        match node {
            XNode::Attribute(owner, i) => match test {
                NodeTest::Any | NodeTest::Node => true,
                NodeTest::Name(name) => self.doc.attrs(owner)[i].name == *name,
                NodeTest::Text | NodeTest::Comment => false,
            },
            XNode::Node(id) => match test {
                NodeTest::Any => self.doc.is_element(id),
                NodeTest::Name(name) => self.doc.tag_name(id) == Some(name.as_str()),
                NodeTest::Node => true,
                NodeTest::Text => self.doc.is_text(id),
                NodeTest::Comment => self.doc.is_comment(id),
            },
        }
    }

    // === Conversions ===

    fn string_value(&self, node: XNode) -> String {
        node.string_value(self.doc)
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|&n| self.string_value(n))
                .unwrap_or_default(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::String(s) => parse_number(s),
            Value::NodeSet(_) => parse_number(&self.string(value)),
        }
    }

    #[allow(clippy::unused_self)]
    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::NodeSet(a), Value::NodeSet(b)) => a.iter().any(|&x| {
                let sx = Value::String(self.string_value(x));
                b.iter()
                    .any(|&y| self.compare_atomic(op, &sx, &Value::String(self.string_value(y))))
            }),
            (Value::NodeSet(a), Value::Boolean(_)) => {
                self.compare_atomic(op, &Value::Boolean(!a.is_empty()), right)
            }
            (Value::Boolean(_), Value::NodeSet(b)) => {
                self.compare_atomic(op, left, &Value::Boolean(!b.is_empty()))
            }
            (Value::NodeSet(a), _) => a
                .iter()
                .any(|&x| self.compare_atomic(op, &Value::String(self.string_value(x)), right)),
            (_, Value::NodeSet(b)) => b
                .iter()
                .any(|&y| self.compare_atomic(op, left, &Value::String(self.string_value(y)))),
            _ => self.compare_atomic(op, left, right),
        }
    }

    fn compare_atomic(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = if matches!(left, Value::Boolean(_)) || matches!(right, Value::Boolean(_)) {
                    self.boolean(left) == self.boolean(right)
                } else if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
                    self.number(left) == self.number(right)
                } else {
                    self.string(left) == self.string(right)
                };
                if op == BinaryOp::Eq {
                    equal
                } else {
                    !equal
                }
            }
            _ => {
                let (l, r) = (self.number(left), self.number(right));
                match op {
                    BinaryOp::Lt => l < r,
                    BinaryOp::Le => l <= r,
                    BinaryOp::Gt => l > r,
                    _ => l >= r,
                }
            }
        }
    }

    // === Core function library ===

    fn call(&self, name: &str, args: &[Expr], ctx: Context) -> Result<Value> {
        let arity = |min: usize, max: usize| -> Result<()> {
            if args.len() < min || args.len() > max {
                return Err(Error::InvalidXPath(format!(
                    "{name}() takes {min}..={max} arguments, got {}",
                    args.len()
                )));
            }
            Ok(())
        };
        let arg_string = |i: usize| -> Result<String> {
            match args.get(i) {
                Some(expr) => Ok(self.string(&self.eval(expr, ctx)?)),
                None => Ok(self.string_value(ctx.node)),
            }
        };
        let arg_number = |i: usize| -> Result<f64> { Ok(self.number(&self.eval(&args[i], ctx)?)) };

        let value = match name {
            "last" => {
                arity(0, 0)?;
                Value::Number(ctx.size as f64)
            }
            "position" => {
                arity(0, 0)?;
                Value::Number(ctx.position as f64)
            }
            "count" => {
                arity(1, 1)?;
                Value::Number(self.eval_nodes(&args[0], ctx)?.len() as f64)
            }
            "name" | "local-name" => {
                arity(0, 1)?;
                let node = match args.first() {
                    Some(expr) => self.eval_nodes(expr, ctx)?.first().copied(),
                    None => Some(ctx.node),
                };
                Value::String(node.map(|n| self.node_name(n)).unwrap_or_default())
            }
            "string" => {
                arity(0, 1)?;
                Value::String(arg_string(0)?)
            }
            "concat" => {
                if args.len() < 2 {
                    return Err(Error::InvalidXPath("concat() takes at least 2 arguments".into()));
                }
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&arg_string(i)?);
                }
                Value::String(out)
            }
            "starts-with" => {
                arity(2, 2)?;
                Value::Boolean(arg_string(0)?.starts_with(&arg_string(1)?))
            }
            "ends-with" => {
                arity(2, 2)?;
                Value::Boolean(arg_string(0)?.ends_with(&arg_string(1)?))
            }
            "contains" => {
                arity(2, 2)?;
                Value::Boolean(arg_string(0)?.contains(&arg_string(1)?))
            }
            "substring-before" => {
                arity(2, 2)?;
                let (s, sep) = (arg_string(0)?, arg_string(1)?);
                Value::String(s.find(&sep).map(|i| s[..i].to_string()).unwrap_or_default())
            }
            "substring-after" => {
                arity(2, 2)?;
                let (s, sep) = (arg_string(0)?, arg_string(1)?);
                Value::String(
                    s.find(&sep)
                        .map(|i| s[i + sep.len()..].to_string())
                        .unwrap_or_default(),
                )
            }
            "substring" => {
                arity(2, 3)?;
                let s = arg_string(0)?;
                let start = round_half_up(arg_number(1)?);
                let end = if args.len() == 3 {
                    start + round_half_up(arg_number(2)?)
                } else {
                    f64::INFINITY
                };
                let out: String = s
                    .chars()
                    .enumerate()
                    .filter(|&(i, _)| {
                        let p = (i + 1) as f64;
                        p >= start && p < end
                    })
                    .map(|(_, c)| c)
                    .collect();
                Value::String(out)
            }
            "string-length" => {
                arity(0, 1)?;
                Value::Number(arg_string(0)?.chars().count() as f64)
            }
            "normalize-space" => {
                arity(0, 1)?;
                Value::String(arg_string(0)?.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            "translate" => {
                arity(3, 3)?;
                let (s, from, to) = (arg_string(0)?, arg_string(1)?, arg_string(2)?);
                let from: Vec<char> = from.chars().collect();
                let to: Vec<char> = to.chars().collect();
                let out: String = s
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect();
                Value::String(out)
            }
            "boolean" => {
                arity(1, 1)?;
                Value::Boolean(self.boolean(&self.eval(&args[0], ctx)?))
            }
            "not" => {
                arity(1, 1)?;
                Value::Boolean(!self.boolean(&self.eval(&args[0], ctx)?))
            }
            "true" => {
                arity(0, 0)?;
                Value::Boolean(true)
            }
            "false" => {
                arity(0, 0)?;
                Value::Boolean(false)
            }
            "number" => {
                arity(0, 1)?;
                match args.first() {
                    Some(expr) => Value::Number(self.number(&self.eval(expr, ctx)?)),
                    None => Value::Number(parse_number(&self.string_value(ctx.node))),
                }
            }
            "sum" => {
                arity(1, 1)?;
                let total = self
                    .eval_nodes(&args[0], ctx)?
                    .into_iter()
                    .map(|n| parse_number(&self.string_value(n)))
                    .sum();
                Value::Number(total)
            }
            "floor" => {
                arity(1, 1)?;
                Value::Number(arg_number(0)?.floor())
            }
            "ceiling" => {
                arity(1, 1)?;
                Value::Number(arg_number(0)?.ceil())
            }
            "round" => {
                arity(1, 1)?;
                Value::Number(round_half_up(arg_number(0)?))
            }
            other => {
                return Err(Error::InvalidXPath(format!("unknown function {other}()")));
            }
        };
        Ok(value)
    }

    fn node_name(&self, node: XNode) -> String {
        match node {
            XNode::Attribute(owner, i) => self.doc.attrs(owner)[i].name.clone(),
            XNode::Node(id) => self.doc.tag_name(id).unwrap_or_default().to_string(),
        }
    }
}

fn round_half_up(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if valid {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
