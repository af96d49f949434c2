//! Compiles structured control flow (block/if/switch/goto) into the flat
//! guarded edge list the orchestration model consumes.
//!
//! The statement tree is transient: it exists only while a structured program
//! is being turned into paths and is discarded afterwards.

use std::collections::HashSet;

use crate::types::PathDoc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Simple(Simple),
    Goto(Goto),
    Block(Block),
    If(If),
    Switch(Switch),
}

/// A plain activity reference, optionally guarded on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simple {
    pub name: String,
    pub guard: String,
}

/// An unconditional jump. Ends the surrounding chain without producing a
/// merge edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goto {
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub children: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: String,
    pub then: Box<Statement>,
    pub otherwise: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub condition: String,
    pub body: Statement,
}

impl Statement {
    pub fn simple(name: impl Into<String>) -> Self {
        Self::Simple(Simple {
            name: name.into(),
            guard: String::new(),
        })
    }

    pub fn guarded(name: impl Into<String>, guard: impl Into<String>) -> Self {
        Self::Simple(Simple {
            name: name.into(),
            guard: guard.into(),
        })
    }

    pub fn goto(target: impl Into<String>) -> Self {
        Self::Goto(Goto {
            target: target.into(),
        })
    }

    pub fn block(children: Vec<Statement>) -> Self {
        Self::Block(Block { children })
    }

    pub fn branch(
        condition: impl Into<String>,
        then: Statement,
        otherwise: Option<Statement>,
    ) -> Self {
        Self::If(If {
            condition: condition.into(),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        })
    }

    pub fn switch(cases: Vec<Case>) -> Self {
        Self::Switch(Switch { cases })
    }

    /// Flatten the tree into a deduplicated edge list in encounter order.
    /// Deterministic: two calls yield identical lists.
    pub fn paths(&self) -> Result<Vec<PathDoc>, StatementError> {
        let mut out = Vec::new();
        self.flatten(&mut out)?;

        let mut seen = HashSet::new();
        out.retain(|p| seen.insert((p.source.clone(), p.target.clone(), p.constraint.clone())));
        Ok(out)
    }

    fn flatten(&self, out: &mut Vec<PathDoc>) -> Result<Flow, StatementError> {
        match self {
            Statement::Simple(s) => {
                if s.name.is_empty() {
                    return Err(StatementError::EmptyName);
                }
                Ok(Flow {
                    entries: vec![Entry {
                        name: s.name.clone(),
                        guard: s.guard.clone(),
                    }],
                    exits: vec![s.name.clone()],
                    passes_through: false,
                    ends_in_goto: false,
                })
            }
            Statement::Goto(g) => {
                if g.target.is_empty() {
                    return Err(StatementError::EmptyName);
                }
                Ok(Flow {
                    entries: vec![Entry {
                        name: g.target.clone(),
                        guard: String::new(),
                    }],
                    exits: Vec::new(),
                    passes_through: false,
                    ends_in_goto: true,
                })
            }
            Statement::Block(b) => flatten_block(b, out),
            Statement::If(i) => flatten_if(i, out),
            Statement::Switch(s) => flatten_switch(s, out),
        }
    }
}

/// How control enters and leaves one flattened statement.
struct Flow {
    entries: Vec<Entry>,
    exits: Vec<String>,
    /// Control may bypass this statement entirely (an `if` without an else).
    passes_through: bool,
    ends_in_goto: bool,
}

struct Entry {
    name: String,
    guard: String,
}

fn flatten_block(b: &Block, out: &mut Vec<PathDoc>) -> Result<Flow, StatementError> {
    let mut children = b.children.iter();
    let first = children
        .next()
        .ok_or(StatementError::EmptyBlock)?
        .flatten(out)?;

    let mut entries = first.entries;
    let mut frontier = first.exits;
    let mut entry_open = first.passes_through;
    let mut ends_in_goto = first.ends_in_goto;

    for child in children {
        if ends_in_goto {
            // The chain already jumped away; nothing below is reachable
            // from this block.
            break;
        }
        let flow = child.flatten(out)?;

        // Chain: every live exit feeds every entry of the following child,
        // constrained by that entry's guard.
        for src in &frontier {
            for e in &flow.entries {
                out.push(PathDoc::guarded(src.clone(), e.name.clone(), e.guard.clone()));
            }
        }
        // A pass-through first child leaves the block entry open onto the
        // next child as well.
        if entry_open {
            entries.extend(flow.entries.iter().map(|e| Entry {
                name: e.name.clone(),
                guard: e.guard.clone(),
            }));
            entry_open = flow.passes_through;
        }

        if flow.ends_in_goto {
            // The jump edge above is the last one taken from this block.
            frontier.clear();
            ends_in_goto = true;
            break;
        }
        ends_in_goto = false;

        let mut next_frontier = flow.exits;
        if flow.passes_through {
            next_frontier.append(&mut frontier);
        }
        frontier = next_frontier;
    }

    Ok(Flow {
        entries,
        exits: frontier,
        passes_through: false,
        ends_in_goto,
    })
}

fn flatten_if(i: &If, out: &mut Vec<PathDoc>) -> Result<Flow, StatementError> {
    if i.condition.is_empty() {
        return Err(StatementError::EmptyCondition);
    }

    let then = i.then.flatten(out)?;
    // The branch condition gates entry; the else leg stays ungated since
    // exactly one of the two fires under the selection policy.
    let mut entries: Vec<Entry> = then
        .entries
        .into_iter()
        .map(|e| Entry {
            name: e.name,
            guard: i.condition.clone(),
        })
        .collect();
    let mut exits = then.exits;

    match &i.otherwise {
        Some(otherwise) => {
            let flow = otherwise.flatten(out)?;
            entries.extend(flow.entries.into_iter().map(|e| Entry {
                name: e.name,
                guard: String::new(),
            }));
            exits.extend(flow.exits);
            Ok(Flow {
                entries,
                exits,
                passes_through: false,
                ends_in_goto: false,
            })
        }
        None => Ok(Flow {
            entries,
            exits,
            passes_through: true,
            ends_in_goto: false,
        }),
    }
}

fn flatten_switch(s: &Switch, out: &mut Vec<PathDoc>) -> Result<Flow, StatementError> {
    if s.cases.is_empty() {
        return Err(StatementError::EmptySwitch);
    }

    let mut entries = Vec::new();
    let mut exits = Vec::new();
    for case in &s.cases {
        let flow = case.body.flatten(out)?;
        entries.extend(flow.entries.into_iter().map(|e| Entry {
            name: e.name,
            guard: case.condition.clone(),
        }));
        exits.extend(flow.exits);
    }

    Ok(Flow {
        entries,
        exits,
        passes_through: false,
        ends_in_goto: false,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatementError {
    #[error("block must have at least one child")]
    EmptyBlock,
    #[error("switch must have at least one case")]
    EmptySwitch,
    #[error("statement name must not be empty")]
    EmptyName,
    #[error("branch condition must not be empty")]
    EmptyCondition,
}
