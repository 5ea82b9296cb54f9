//! Shared lowering of a program to per-leaf backend operations.
//!
//! Every backend goes through [`lower`], so a signal reference resolves,
//! mangles, and encodes the same way whichever artifact is produced. Lowering
//! expands composite references to their packed leaves in declared order,
//! computes each leaf's address under the backend's naming scheme, claims it
//! in the emission's [`NameTable`](vigil_mangle::NameTable), and splits
//! values into one word per leaf.

use crate::context::BackendContext;
use crate::error::{BackendError, LowerError};
use tracing::debug;
use vigil_actions::{NodeKind, Program, ResolvedExpected};
use vigil_common::{InternalError, LogicVec, VigilResult};
use vigil_mangle::{Address, NamingScheme};
use vigil_signal::{Direction, ResolvedPath, SignalPath};
use vigil_value::{encode, Literal};

/// One packed leaf signal as a backend addresses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// The canonical path.
    pub path: SignalPath,
    /// The backend address.
    pub address: Address,
    /// The path as text, used in print lines and failure reports.
    pub display: String,
    /// Width of the leaf in bits.
    pub width: u32,
    /// Width of the word `address.name` names. Equals `width` unless the
    /// address selects one bit of a larger word.
    pub word_width: u32,
    /// Whether the leaf holds a signed number.
    pub signed: bool,
}

/// A port of the flattened circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    /// The canonical path of the packed port leaf.
    pub path: SignalPath,
    /// The backend identifier.
    pub name: String,
    /// Port direction.
    pub direction: Direction,
    /// Width in bits.
    pub width: u32,
    /// Whether the port is signed.
    pub signed: bool,
}

/// One word to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    /// The driven leaf.
    pub leaf: Leaf,
    /// The value, exactly `leaf.width` bits.
    pub bits: LogicVec,
}

/// The right-hand side of one leaf comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A constant word.
    Const(LogicVec),
    /// The current value of another leaf of the same width.
    Signal(Leaf),
}

/// One leaf comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// The checked leaf.
    pub leaf: Leaf,
    /// What it should hold.
    pub expected: Operand,
}

/// A lowered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Drive every word.
    Poke(Vec<Write>),
    /// Compare every leaf.
    Expect(Vec<Check>),
    /// Settle combinational logic.
    Eval,
    /// Toggle `clock` `count` times, settling after each toggle.
    Step {
        /// The clock leaf.
        clock: Leaf,
        /// The number of toggles.
        count: u32,
    },
    /// Print every leaf.
    Print(Vec<Leaf>),
    /// Read every leaf.
    Peek(Vec<Leaf>),
}

/// A lowered action with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The action's position in the program.
    pub index: usize,
    /// The action as text.
    pub text: String,
    /// The operation.
    pub op: Op,
}

/// A program lowered for one naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    /// The circuit name.
    pub circuit: String,
    /// The flattened ports in declaration order.
    pub ports: Vec<PortDecl>,
    /// The lowered actions in order.
    pub steps: Vec<Step>,
}

impl Lowered {
    /// Ports driven by the testbench.
    pub fn inputs(&self) -> impl Iterator<Item = &PortDecl> {
        self.ports
            .iter()
            .filter(|p| matches!(p.direction, Direction::In | Direction::InOut))
    }
}

/// Lowers `program` under `scheme`, claiming every address in `ctx.names`.
///
/// Ports are claimed first, so an action leaf whose address collides with a
/// different port is reported against that action.
pub fn lower(
    program: &Program,
    scheme: &NamingScheme,
    ctx: &mut BackendContext,
) -> Result<Lowered, BackendError> {
    let circuit = program.circuit();
    circuit.validate().map_err(BackendError::Circuit)?;
    let mut ports = Vec::new();
    for port in circuit.packed_ports() {
        let address = ctx
            .names
            .address(scheme, &port)
            .map_err(|source| BackendError::Port {
                path: port.to_string(),
                source,
            })?;
        ports.push(PortDecl {
            path: port.path().clone(),
            name: address.name,
            direction: port.direction(),
            width: port.ty().width(),
            signed: port.ty().is_signed(),
        });
    }

    let mut steps = Vec::with_capacity(program.len());
    for node in program.nodes() {
        let op = lower_node(&node.kind, scheme, ctx).map_err(|(path, source)| {
            BackendError::Lowering {
                index: node.index,
                path,
                source,
            }
        })?;
        let text = program
            .actions()
            .get(node.index)
            .map(ToString::to_string)
            .unwrap_or_default();
        debug!(scheme = scheme.name, index = node.index, action = %text, "lowered");
        steps.push(Step {
            index: node.index,
            text,
            op,
        });
    }

    Ok(Lowered {
        circuit: circuit.name.clone(),
        ports,
        steps,
    })
}

type NodeError = (String, LowerError);

fn lower_node(
    kind: &NodeKind,
    scheme: &NamingScheme,
    ctx: &mut BackendContext,
) -> Result<Op, NodeError> {
    match kind {
        NodeKind::Poke { target, value } => {
            let literal = encode(value, target.ty()).map_err(|e| at(target, e.into()))?;
            let words = split(target, &literal).map_err(|e| at(target, e.into()))?;
            let mut writes = Vec::new();
            for (path, bits) in words {
                writes.push(Write {
                    leaf: leaf(&path, scheme, ctx)?,
                    bits,
                });
            }
            Ok(Op::Poke(writes))
        }
        NodeKind::Expect { target, expected } => {
            let checks = match expected {
                ResolvedExpected::Value(value) => {
                    let literal =
                        encode(value, target.ty()).map_err(|e| at(target, e.into()))?;
                    let words = split(target, &literal).map_err(|e| at(target, e.into()))?;
                    let mut checks = Vec::new();
                    for (path, bits) in words {
                        checks.push(Check {
                            leaf: leaf(&path, scheme, ctx)?,
                            expected: Operand::Const(bits),
                        });
                    }
                    checks
                }
                ResolvedExpected::Peek(other) => {
                    let ours = target.leaves();
                    let theirs = other.leaves();
                    check_shapes(target, other, &ours, &theirs)?;
                    let mut checks = Vec::new();
                    for (a, b) in ours.iter().zip(&theirs) {
                        checks.push(Check {
                            leaf: leaf(a, scheme, ctx)?,
                            expected: Operand::Signal(leaf(b, scheme, ctx)?),
                        });
                    }
                    checks
                }
            };
            Ok(Op::Expect(checks))
        }
        NodeKind::Eval => Ok(Op::Eval),
        NodeKind::Step { clock, count } => Ok(Op::Step {
            clock: leaf(clock, scheme, ctx)?,
            count: *count,
        }),
        NodeKind::Print { target } => Ok(Op::Print(leaves(target, scheme, ctx)?)),
        NodeKind::Peek { target } => Ok(Op::Peek(leaves(target, scheme, ctx)?)),
    }
}

fn at(path: &ResolvedPath, error: LowerError) -> NodeError {
    (path.to_string(), error)
}

fn leaf(
    path: &ResolvedPath,
    scheme: &NamingScheme,
    ctx: &mut BackendContext,
) -> Result<Leaf, NodeError> {
    let address = ctx
        .names
        .address(scheme, path)
        .map_err(|e| at(path, e.into()))?;
    let width = path.ty().width();
    let word_width = match (address.bit, path.parent_ty()) {
        (Some(_), Some(parent)) => parent.width(),
        _ => width,
    };
    Ok(Leaf {
        path: path.path().clone(),
        address,
        display: path.to_string(),
        width,
        word_width,
        signed: path.ty().is_signed(),
    })
}

fn leaves(
    path: &ResolvedPath,
    scheme: &NamingScheme,
    ctx: &mut BackendContext,
) -> Result<Vec<Leaf>, NodeError> {
    path.leaves()
        .iter()
        .map(|p| leaf(p, scheme, ctx))
        .collect()
}

fn check_shapes(
    target: &ResolvedPath,
    other: &ResolvedPath,
    ours: &[ResolvedPath],
    theirs: &[ResolvedPath],
) -> Result<(), NodeError> {
    let mismatch = |reason: String| {
        at(
            target,
            LowerError::ShapeMismatch {
                target: target.to_string(),
                other: other.to_string(),
                reason,
            },
        )
    };
    if ours.len() != theirs.len() {
        return Err(mismatch(format!(
            "{} leaves vs {}",
            ours.len(),
            theirs.len()
        )));
    }
    for (a, b) in ours.iter().zip(theirs) {
        if a.ty().width() != b.ty().width() {
            return Err(mismatch(format!(
                "`{a}` is {} bits but `{b}` is {}",
                a.ty().width(),
                b.ty().width()
            )));
        }
    }
    Ok(())
}

/// Splits a literal shaped like `path`'s type into one word per packed leaf,
/// in the same order as [`ResolvedPath::leaves`].
///
/// The literal comes from [`encode`] against the same type, so a shape that
/// does not line up is a bug.
fn split(path: &ResolvedPath, literal: &Literal) -> VigilResult<Vec<(ResolvedPath, LogicVec)>> {
    let mut out = Vec::new();
    split_into(path, literal, &mut out)?;
    Ok(out)
}

fn split_into(
    path: &ResolvedPath,
    literal: &Literal,
    out: &mut Vec<(ResolvedPath, LogicVec)>,
) -> VigilResult<()> {
    if path.ty().is_packed() {
        out.push((path.clone(), literal.pack()));
        return Ok(());
    }
    let misshapen =
        || InternalError::new(format!("encoded literal does not match the shape of `{path}`"));
    match literal {
        Literal::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child = path.child_index(i as u32).ok_or_else(misshapen)?;
                split_into(&child, item, out)?;
            }
        }
        Literal::Tuple(fields) => {
            for (key, item) in fields {
                let child = path.child_field(key).ok_or_else(misshapen)?;
                split_into(&child, item, out)?;
            }
        }
        Literal::Word(bits) => match Literal::unpack(bits, path.ty()) {
            Ok(shaped) if !matches!(shaped, Literal::Word(_)) => split_into(path, &shaped, out)?,
            _ => return Err(misshapen()),
        },
    }
    Ok(())
}
