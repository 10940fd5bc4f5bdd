//! Structural paths into a value and sets of them.
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::ty::Ty;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathStep {
    Attr(String),   // object attribute
    Index(usize),   // list or tuple element
    Key(String),    // map key
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<PathStep>);

impl Path {
    pub fn root() -> Self { Self::default() }

    pub fn steps(&self) -> &[PathStep] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn push(&mut self, step: PathStep) { self.0.push(step); }
    pub fn pop(&mut self) -> Option<PathStep> { self.0.pop() }

    pub fn child(&self, step: PathStep) -> Self {
        let mut out = self.clone();
        out.push(step);
        out
    }
    pub fn attr(&self, name: impl Into<String>) -> Self { self.child(PathStep::Attr(name.into())) }
    pub fn index(&self, i: usize) -> Self { self.child(PathStep::Index(i)) }
    pub fn key(&self, k: impl Into<String>) -> Self { self.child(PathStep::Key(k.into())) }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Path(rest.to_vec()))
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Resolve an RFC 6901 JSON pointer against a declared type, so each token
    /// becomes the step kind the type dictates.
    pub fn from_pointer(pointer: &str, ty: &Ty) -> Result<Self, PathError> {
        if pointer.is_empty() {
            return Ok(Path::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PathError::Malformed(pointer.to_string()));
        };

        let mut path = Path::root();
        let mut cur = ty;
        for raw in rest.split('/') {
            let token = unescape_token(raw);
            let (step, next) = resolve_token(&token, cur, &path)?;
            path.push(step);
            cur = next;
        }
        Ok(path)
    }
}

static DYNAMIC: Ty = Ty::Dynamic;

fn resolve_token<'t>(token: &str, ty: &'t Ty, at: &Path) -> Result<(PathStep, &'t Ty), PathError> {
    let index = || token.parse::<usize>().map_err(|_| PathError::BadIndex {
        at: at.clone(),
        token: token.to_string(),
    });
    match ty {
        Ty::Object(_) => {
            let field = ty.field(token).ok_or_else(|| PathError::UnknownAttr {
                at: at.clone(),
                name: token.to_string(),
            })?;
            Ok((PathStep::Attr(token.to_string()), &field.ty))
        }
        Ty::Map(value) => Ok((PathStep::Key(token.to_string()), &**value)),
        Ty::List(item) => Ok((PathStep::Index(index()?), &**item)),
        Ty::Tuple(elems) => {
            let i = index()?;
            let elem = elems.get(i).ok_or_else(|| PathError::BadIndex {
                at: at.clone(),
                token: token.to_string(),
            })?;
            Ok((PathStep::Index(i), elem))
        }
        Ty::Dynamic => match token.parse::<usize>() {
            Ok(i) => Ok((PathStep::Index(i), &DYNAMIC)),
            Err(_) => Ok((PathStep::Attr(token.to_string()), &DYNAMIC)),
        },
        primitive => Err(PathError::NotAContainer {
            at: at.clone(),
            ty: primitive.friendly_name(),
        }),
    }
}

/// `~1` → `/`, then `~0` → `~`.
fn unescape_token(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Attr(name) if is_plain_name(name) => write!(f, ".{name}"),
            PathStep::Attr(name) => write!(f, ".{name:?}"),
            PathStep::Index(i) => write!(f, "[{i}]"),
            PathStep::Key(k) => write!(f, "[{k:?}]"),
        }
    }
}

/// Attribute names that print bare; anything else is quoted so it cannot be
/// mistaken for further steps.
fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        for step in &self.0 {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self { Path(steps) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed JSON pointer {0:?}: must be empty or start with '/'")]
    Malformed(String),
    #[error("at {at}: no attribute named {name:?}")]
    UnknownAttr { at: Path, name: String },
    #[error("at {at}: {token:?} is not a valid element index")]
    BadIndex { at: Path, token: String },
    #[error("at {at}: cannot descend into a {ty}")]
    NotAContainer { at: Path, ty: String },
}

// ------------------------------- PathSet --------------------------------- //

/// A set of paths. Iteration follows path order, so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathSet {
    paths: BTreeSet<Path>,
}

impl PathSet {
    pub fn new() -> Self { Self::default() }

    pub fn from_paths(paths: impl IntoIterator<Item = Path>) -> Self {
        paths.into_iter().collect()
    }

    pub fn contains(&self, path: &Path) -> bool { self.paths.contains(path) }
    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Path> { self.paths.iter() }

    /// Returns false if the path was already present.
    pub fn insert(&mut self, path: Path) -> bool { self.paths.insert(path) }

    /// Insert `path` and every prefix of it, root included.
    pub fn insert_all_steps(&mut self, path: &Path) {
        for n in 0..=path.len() {
            self.paths.insert(Path(path.0[..n].to_vec()));
        }
    }

    pub fn remove(&mut self, path: &Path) -> bool { self.paths.remove(path) }

    pub fn union(&self, other: &PathSet) -> PathSet {
        PathSet { paths: &self.paths | &other.paths }
    }
    pub fn intersection(&self, other: &PathSet) -> PathSet {
        PathSet { paths: &self.paths & &other.paths }
    }
    pub fn difference(&self, other: &PathSet) -> PathSet {
        PathSet { paths: &self.paths - &other.paths }
    }
    pub fn symmetric_difference(&self, other: &PathSet) -> PathSet {
        PathSet { paths: &self.paths ^ &other.paths }
    }
}

impl FromIterator<Path> for PathSet {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        PathSet { paths: iter.into_iter().collect() }
    }
}

impl IntoIterator for PathSet {
    type Item = Path;
    type IntoIter = std::collections::btree_set::IntoIter<Path>;
    fn into_iter(self) -> Self::IntoIter { self.paths.into_iter() }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Path;
    type IntoIter = std::collections::btree_set::Iter<'a, Path>;
    fn into_iter(self) -> Self::IntoIter { self.paths.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_ty() -> Ty {
        Ty::object([
            ("name", Ty::String),
            ("tags", Ty::map(Ty::String)),
            ("disks", Ty::list(Ty::object([("size", Ty::Integer)]))),
            ("origin", Ty::tuple([Ty::Number, Ty::Number])),
            ("extra", Ty::Dynamic),
        ])
    }

    #[test]
    fn displays_each_step_kind() {
        let p = Path::root().attr("disks").index(0).attr("size");
        assert_eq!(p.to_string(), ".disks[0].size");
        assert_eq!(Path::root().attr("tags").key("a/b").to_string(), r#".tags["a/b"]"#);
        assert_eq!(Path::root().to_string(), "(root)");
    }

    #[test]
    fn odd_attribute_names_are_quoted() {
        assert_eq!(Path::root().attr("a.b").to_string(), r#"."a.b""#);
        assert_eq!(Path::root().attr("a").attr("b").to_string(), ".a.b");
        assert_eq!(Path::root().attr("x[0]").to_string(), r#"."x[0]""#);
        assert_eq!(Path::root().attr("two words").to_string(), r#"."two words""#);
        assert_eq!(Path::root().attr("").to_string(), r#"."""#);
        assert_eq!(Path::root().attr("_id").attr("ttl-s").to_string(), "._id.ttl-s");
        assert_ne!(Path::root().attr("a.b").to_string(), Path::root().attr("a").attr("b").to_string());
    }

    #[test]
    fn pointer_tokens_follow_the_declared_type() {
        let ty = server_ty();
        assert_eq!(
            Path::from_pointer("/disks/1/size", &ty).unwrap(),
            Path::root().attr("disks").index(1).attr("size"),
        );
        assert_eq!(
            Path::from_pointer("/tags/a~1b~0c", &ty).unwrap(),
            Path::root().attr("tags").key("a/b~c"),
        );
        assert_eq!(
            Path::from_pointer("/extra/3/x", &ty).unwrap(),
            Path::root().attr("extra").index(3).attr("x"),
        );
        assert_eq!(Path::from_pointer("", &ty).unwrap(), Path::root());
    }

    #[test]
    fn pointer_errors() {
        let ty = server_ty();
        assert_eq!(Path::from_pointer("name", &ty), Err(PathError::Malformed("name".into())));
        assert!(matches!(Path::from_pointer("/nope", &ty), Err(PathError::UnknownAttr { .. })));
        assert!(matches!(Path::from_pointer("/disks/x", &ty), Err(PathError::BadIndex { .. })));
        assert!(matches!(Path::from_pointer("/origin/2", &ty), Err(PathError::BadIndex { .. })));
        let err = Path::from_pointer("/name/0", &ty).unwrap_err();
        assert_eq!(err.to_string(), "at .name: cannot descend into a string");
    }

    #[test]
    fn parent_and_prefix() {
        let p = Path::root().attr("a").index(2);
        assert_eq!(p.parent(), Some(Path::root().attr("a")));
        assert_eq!(Path::root().parent(), None);
        assert!(p.starts_with(&Path::root().attr("a")));
        assert!(!p.starts_with(&Path::root().attr("b")));
    }

    #[test]
    fn set_collapses_duplicates_and_answers_membership() {
        let name = Path::root().attr("name");
        let set = PathSet::from_paths([name.clone(), name.clone(), Path::root().attr("size")]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&name));
        assert!(!set.contains(&Path::root().attr("other")));
    }

    #[test]
    fn insert_all_steps_adds_every_prefix() {
        let mut set = PathSet::new();
        set.insert_all_steps(&Path::root().attr("a").index(0));
        let got: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(got, ["(root)", ".a", ".a[0]"]);
    }

    #[test]
    fn set_algebra() {
        let a = Path::root().attr("a");
        let b = Path::root().attr("b");
        let c = Path::root().attr("c");
        let x = PathSet::from_paths([a.clone(), b.clone()]);
        let y = PathSet::from_paths([b.clone(), c.clone()]);
        assert_eq!(x.union(&y).len(), 3);
        assert_eq!(x.intersection(&y), PathSet::from_paths([b.clone()]));
        assert_eq!(x.difference(&y), PathSet::from_paths([a.clone()]));
        assert_eq!(x.symmetric_difference(&y), PathSet::from_paths([a, c]));

        let mut z = x.clone();
        assert!(z.remove(&b));
        assert!(!z.remove(&b));
        assert!(!z.insert(Path::root().attr("a")));
    }
}
