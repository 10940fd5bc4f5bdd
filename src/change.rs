//! A single validated change to one typed value.
//!
//! A `Change` is only obtainable through [`Change::create`], [`Change::read`],
//! [`Change::update`], [`Change::replace`] and [`Change::delete`]. Each checks
//! the supplied values against the declared type first, so every live `Change`
//! holds values that conform to its type. There is no mutation API.
use std::fmt;
use std::str::FromStr;

use crate::error::{ChangeError, Side};
use crate::path::PathSet;
use crate::ty::Ty;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Replace,
}

impl Action {
    pub const ALL: [Action; 5] = [Action::Create, Action::Read, Action::Update, Action::Delete, Action::Replace];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Replace => "replace",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL.into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action {s:?}, expected one of create, read, update, delete, replace"))
    }
}

/// Per-action payload. Only the values meaningful for an action exist.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Create { new: Value },
    /// `new` may contain unknown leaves for values not yet resolved.
    Read { new: Value },
    Update { old: Value, new: Value },
    /// `forced_replace` holds the paths that made an in-place update impossible.
    Replace { old: Value, new: Value, forced_replace: PathSet },
    Delete { old: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    ty: Ty,
    kind: ChangeKind,
}

static NULL: Value = Value::Null;

impl Change {
    pub fn create(ty: Ty, v: Value) -> Result<Self, ChangeError> {
        conform(&ty, &v, Side::New)?;
        Ok(Self::built(ty, ChangeKind::Create { new: v }))
    }

    pub fn read(ty: Ty, v: Value) -> Result<Self, ChangeError> {
        conform(&ty, &v, Side::New)?;
        Ok(Self::built(ty, ChangeKind::Read { new: v }))
    }

    pub fn update(ty: Ty, old: Value, new: Value) -> Result<Self, ChangeError> {
        conform(&ty, &old, Side::Old)?;
        conform(&ty, &new, Side::New)?;
        Ok(Self::built(ty, ChangeKind::Update { old, new }))
    }

    pub fn replace(ty: Ty, old: Value, new: Value, forced_replace: PathSet) -> Result<Self, ChangeError> {
        conform(&ty, &old, Side::Old)?;
        conform(&ty, &new, Side::New)?;
        Ok(Self::built(ty, ChangeKind::Replace { old, new, forced_replace }))
    }

    pub fn delete(ty: Ty, v: Value) -> Result<Self, ChangeError> {
        conform(&ty, &v, Side::Old)?;
        Ok(Self::built(ty, ChangeKind::Delete { old: v }))
    }

    fn built(ty: Ty, kind: ChangeKind) -> Self {
        let change = Self { ty, kind };
        tracing::trace!(action = %change.action(), "change constructed");
        change
    }

    pub fn action(&self) -> Action {
        match &self.kind {
            ChangeKind::Create { .. } => Action::Create,
            ChangeKind::Read { .. } => Action::Read,
            ChangeKind::Update { .. } => Action::Update,
            ChangeKind::Replace { .. } => Action::Replace,
            ChangeKind::Delete { .. } => Action::Delete,
        }
    }

    /// The declared type both values conform to.
    pub fn ty(&self) -> &Ty { &self.ty }

    pub fn kind(&self) -> &ChangeKind { &self.kind }

    /// Value before the action; null of the declared type for create and read.
    pub fn old(&self) -> &Value {
        match &self.kind {
            ChangeKind::Create { .. } | ChangeKind::Read { .. } => &NULL,
            ChangeKind::Update { old, .. }
            | ChangeKind::Replace { old, .. }
            | ChangeKind::Delete { old } => old,
        }
    }

    /// Value after the action; null of the declared type for delete.
    pub fn new(&self) -> &Value {
        match &self.kind {
            ChangeKind::Delete { .. } => &NULL,
            ChangeKind::Create { new }
            | ChangeKind::Read { new }
            | ChangeKind::Update { new, .. }
            | ChangeKind::Replace { new, .. } => new,
        }
    }

    /// Paths that forced a replacement. Any other action has none to give and
    /// reports a usage error instead of an empty set.
    pub fn forced_replace(&self) -> Result<&PathSet, ChangeError> {
        match &self.kind {
            ChangeKind::Replace { forced_replace, .. } => Ok(forced_replace),
            _ => Err(ChangeError::ForcedReplaceUnavailable { action: self.action() }),
        }
    }

    /// Owned parts: action, type, old, new, and the forced-replace set when the
    /// action is a replace.
    pub fn into_parts(self) -> (Action, Ty, Value, Value, Option<PathSet>) {
        let action = self.action();
        let (old, new, forced) = match self.kind {
            ChangeKind::Create { new } | ChangeKind::Read { new } => (Value::null_of(&self.ty), new, None),
            ChangeKind::Update { old, new } => (old, new, None),
            ChangeKind::Replace { old, new, forced_replace } => (old, new, Some(forced_replace)),
            ChangeKind::Delete { old } => (old, Value::null_of(&self.ty), None),
        };
        (action, self.ty, old, new, forced)
    }
}

fn conform(ty: &Ty, v: &Value, side: Side) -> Result<(), ChangeError> {
    let errors = ty.test_conformance(v);
    if errors.is_empty() {
        return Ok(());
    }
    tracing::debug!(%side, %ty, violations = errors.len(), first = %errors[0], "value rejected");
    Err(ChangeError::Conformance { side, errors })
}
