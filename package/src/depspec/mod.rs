//! Dependency-style specification trees
//!
//! The same tree shape is used for package sets (package atom leaves) and
//! LICENSE expressions (license name leaves):
//!
//! ```text
//! GPL-2 || ( MIT BSD ) doc? ( FDL-1.3 ) !bindist? ( NVIDIA )
//! ```

use crate::{Error, Result};
use pkgenv_config::PackageAtom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A specification tree with leaves of type `T`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepTree<T> {
    /// A single leaf
    Leaf(T),
    /// Every child is required
    All(Vec<DepTree<T>>),
    /// Any one child suffices (`|| ( ... )`)
    Any(Vec<DepTree<T>>),
    /// Children apply only when the USE condition holds (`flag? ( ... )`, `!flag? ( ... )`)
    Conditional {
        flag: String,
        negated: bool,
        children: Vec<DepTree<T>>,
    },
}

/// A tree of package atoms, as produced by package set expansion
pub type DepAtom = DepTree<PackageAtom>;

/// A parsed LICENSE expression
pub type LicenseTree = DepTree<String>;

impl<T> DepTree<T> {
    /// All leaves, depth first, regardless of conditions
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            DepTree::Leaf(leaf) => out.push(leaf),
            DepTree::All(children)
            | DepTree::Any(children)
            | DepTree::Conditional { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Check whether the tree has no leaves at all
    pub fn is_empty(&self) -> bool {
        match self {
            DepTree::Leaf(_) => false,
            DepTree::All(children)
            | DepTree::Any(children)
            | DepTree::Conditional { children, .. } => children.iter().all(|c| c.is_empty()),
        }
    }

    /// Evaluate the tree
    ///
    /// `leaf` decides individual leaves and `use_enabled` decides USE
    /// conditions. An unmet condition makes its group vacuously satisfied, as
    /// does an empty `||` group.
    pub fn evaluate<L, U>(&self, leaf: &L, use_enabled: &U) -> Result<bool>
    where
        L: Fn(&T) -> Result<bool>,
        U: Fn(&str) -> Result<bool>,
    {
        match self {
            DepTree::Leaf(value) => leaf(value),
            DepTree::All(children) => {
                for child in children {
                    if !child.evaluate(leaf, use_enabled)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            DepTree::Any(children) => {
                if children.is_empty() {
                    return Ok(true);
                }
                for child in children {
                    if child.evaluate(leaf, use_enabled)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            DepTree::Conditional {
                flag,
                negated,
                children,
            } => {
                if use_enabled(flag)? == *negated {
                    return Ok(true);
                }
                for child in children {
                    if !child.evaluate(leaf, use_enabled)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

fn write_group<T: fmt::Display>(f: &mut fmt::Formatter<'_>, children: &[DepTree<T>]) -> fmt::Result {
    write!(f, "(")?;
    for child in children {
        write!(f, " {}", child)?;
    }
    write!(f, " )")
}

impl<T: fmt::Display> fmt::Display for DepTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepTree::Leaf(leaf) => write!(f, "{}", leaf),
            DepTree::All(children) => write_group(f, children),
            DepTree::Any(children) => {
                write!(f, "|| ")?;
                write_group(f, children)
            }
            DepTree::Conditional {
                flag,
                negated,
                children,
            } => {
                if *negated {
                    write!(f, "!")?;
                }
                write!(f, "{}? ", flag)?;
                write_group(f, children)
            }
        }
    }
}

/// Parse a specification string into an `All` group, building leaves with `leaf`
pub fn parse_tree<T, F>(s: &str, leaf: F) -> Result<DepTree<T>>
where
    F: Fn(&str) -> Result<T>,
{
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let mut pos = 0;
    let children = parse_items(&tokens, &mut pos, &leaf, s)?;
    if pos != tokens.len() {
        return Err(Error::InvalidDepSpec(format!("unbalanced ')' in '{}'", s)));
    }
    Ok(DepTree::All(children))
}

/// Parse a LICENSE expression
pub fn parse_license(s: &str) -> Result<LicenseTree> {
    parse_tree(s, |name| Ok(name.to_string()))
}

fn parse_items<T, F>(tokens: &[&str], pos: &mut usize, leaf: &F, source: &str) -> Result<Vec<DepTree<T>>>
where
    F: Fn(&str) -> Result<T>,
{
    let mut items = Vec::new();

    while let Some(&token) = tokens.get(*pos) {
        if token == ")" {
            break;
        }
        *pos += 1;

        let item = if token == "||" {
            DepTree::Any(parse_group(tokens, pos, leaf, source)?)
        } else if token == "(" {
            *pos -= 1;
            DepTree::All(parse_group(tokens, pos, leaf, source)?)
        } else if let Some(condition) = token.strip_suffix('?') {
            let (negated, flag) = match condition.strip_prefix('!') {
                Some(flag) => (true, flag),
                None => (false, condition),
            };
            if flag.is_empty() {
                return Err(Error::InvalidDepSpec(format!("empty USE condition in '{}'", source)));
            }
            DepTree::Conditional {
                flag: flag.to_string(),
                negated,
                children: parse_group(tokens, pos, leaf, source)?,
            }
        } else {
            DepTree::Leaf(leaf(token)?)
        };

        items.push(item);
    }

    Ok(items)
}

fn parse_group<T, F>(tokens: &[&str], pos: &mut usize, leaf: &F, source: &str) -> Result<Vec<DepTree<T>>>
where
    F: Fn(&str) -> Result<T>,
{
    if tokens.get(*pos) != Some(&"(") {
        return Err(Error::InvalidDepSpec(format!("expected '(' in '{}'", source)));
    }
    *pos += 1;

    let children = parse_items(tokens, pos, leaf, source)?;

    if tokens.get(*pos) != Some(&")") {
        return Err(Error::InvalidDepSpec(format!("missing ')' in '{}'", source)));
    }
    *pos += 1;

    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> LicenseTree {
        DepTree::Leaf(s.to_string())
    }

    #[test]
    fn test_parse_license() {
        let tree = parse_license("GPL-2 || ( MIT BSD ) doc? ( FDL-1.3 ) !bindist? ( NVIDIA )").unwrap();
        assert_eq!(
            tree,
            DepTree::All(vec![
                leaf("GPL-2"),
                DepTree::Any(vec![leaf("MIT"), leaf("BSD")]),
                DepTree::Conditional {
                    flag: "doc".to_string(),
                    negated: false,
                    children: vec![leaf("FDL-1.3")],
                },
                DepTree::Conditional {
                    flag: "bindist".to_string(),
                    negated: true,
                    children: vec![leaf("NVIDIA")],
                },
            ])
        );
        assert_eq!(tree.leaves().len(), 5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_license("|| MIT").is_err());
        assert!(parse_license("|| ( MIT").is_err());
        assert!(parse_license("MIT )").is_err());
        assert!(parse_license("? ( MIT )").is_err());
        assert!(parse_license("").unwrap().is_empty());
    }

    #[test]
    fn test_evaluate() {
        let tree = parse_license("|| ( MIT EVIL ) doc? ( FDL-1.3 )").unwrap();
        let accept = |l: &String| Ok(l != "EVIL" && l != "FDL-1.3");

        assert!(tree.evaluate(&accept, &|_| Ok(false)).unwrap());
        assert!(!tree.evaluate(&accept, &|_| Ok(true)).unwrap());

        let tree = parse_license("EVIL").unwrap();
        assert!(!tree.evaluate(&accept, &|_| Ok(false)).unwrap());
    }

    #[test]
    fn test_display() {
        let tree = parse_license("A || ( B C ) !x? ( D )").unwrap();
        assert_eq!(tree.to_string(), "( A || ( B C ) !x? ( D ) )");
    }
}
