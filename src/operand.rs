// SPDX-License-Identifier: Apache-2.0

//! Statement operands: SSA names, memory dereferences, and literals.

use once_cell::sync::Lazy;
use regex::Regex;

static VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>[&~-]?)(?P<name>[A-Za-z_][\w.]*)(?P<dd>\(D\))?$")
        .expect("valid var regex")
});

static MEM_BASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^MEM\[base: (?P<addr>&)?(?P<name>[\w.]+)(?P<dd>\(D\))?, offset: (?P<offset>\w+)\]$",
    )
        .expect("valid MEM base regex")
});

static MEM_SHORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^MEM\[(?:\([^)]*\))?(?P<addr>&)?(?P<name>[\w.]+)(?P<dd>\(D\))?(?: \+ (?P<offset>\w+))?\]$",
    )
    .expect("valid MEM shorthand regex")
});

/// Returns true if `s` is usable as a variable name, i.e. starts with a letter
/// or underscore. Literals (`0`, `-1`, `"fmt"`) are not.
pub fn is_identifier(s: &str) -> bool {
    match s.chars().next() {
        Some(c) => c.is_alphabetic() || c == '_',
        None => false,
    }
}

/// A `MEM[...]` operand; treated as a reference to its base variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDereference {
    /// The base is `&name` rather than a pointer held in `name`.
    pub address_of: bool,
    pub name: String,
    pub offset: String,
    pub default_def: bool,
}

impl ArrayDereference {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = MEM_BASE_RE
            .captures(text)
            .or_else(|| MEM_SHORT_RE.captures(text))?;
        Some(ArrayDereference {
            address_of: caps.name("addr").is_some(),
            name: caps["name"].to_string(),
            offset: caps
                .name("offset")
                .map_or_else(|| "0".to_string(), |m| m.as_str().to_string()),
            default_def: caps.name("dd").is_some(),
        })
    }
}

impl std::fmt::Display for ArrayDereference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MEM[base: {}{}{}, offset: {}]",
            if self.address_of { "&" } else { "" },
            self.name,
            if self.default_def { "(D)" } else { "" },
            self.offset
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// An SSA or declared name, e.g. `x_3`, `&buf`, `n_6(D)`.
    Var {
        prefix: Option<char>,
        name: String,
        default_def: bool,
    },
    Mem(ArrayDereference),
    Literal(String),
}

impl Operand {
    /// Classifies a raw operand token. Never fails: anything that is neither a
    /// name nor a dereference is kept verbatim as a literal.
    pub fn parse(text: &str) -> Operand {
        let text = text.trim();
        if let Some(mem) = ArrayDereference::parse(text) {
            return Operand::Mem(mem);
        }
        if let Some(caps) = VAR_RE.captures(text) {
            return Operand::Var {
                prefix: caps["prefix"].chars().next(),
                name: caps["name"].to_string(),
                default_def: caps.name("dd").is_some(),
            };
        }
        Operand::Literal(text.to_string())
    }

    pub fn var(name: &str) -> Operand {
        Operand::Var {
            prefix: None,
            name: name.to_string(),
            default_def: false,
        }
    }

    /// The variable this operand refers to, if any.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Operand::Var { name, .. } => Some(name),
            Operand::Mem(mem) if is_identifier(&mem.name) => Some(&mem.name),
            _ => None,
        }
    }

    /// Text that stands in for this operand when a cast of it is eliminated.
    pub fn substitution_text(&self) -> String {
        match self {
            Operand::Var { name, .. } => name.clone(),
            Operand::Mem(mem) => mem.name.clone(),
            Operand::Literal(text) => text.clone(),
        }
    }

    /// Applies `f` to the referenced name. A replacement that is not an
    /// identifier turns a plain name into a literal. Returns whether anything
    /// changed.
    pub fn rename_with<F>(&mut self, f: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Operand::Var { prefix, name, .. } => {
                let Some(new_name) = f(name) else {
                    return false;
                };
                if new_name == *name {
                    return false;
                }
                if is_identifier(&new_name) {
                    *name = new_name;
                } else {
                    let literal = match prefix {
                        Some(p) => format!("{}{}", p, new_name),
                        None => new_name,
                    };
                    *self = Operand::Literal(literal);
                }
                true
            }
            Operand::Mem(mem) => match f(&mem.name) {
                Some(new_name) if new_name != mem.name => {
                    mem.name = new_name;
                    true
                }
                _ => false,
            },
            Operand::Literal(_) => false,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Var {
                prefix,
                name,
                default_def,
            } => {
                if let Some(p) = prefix {
                    write!(f, "{}", p)?;
                }
                write!(f, "{}", name)?;
                if *default_def {
                    write!(f, "(D)")?;
                }
                Ok(())
            }
            Operand::Mem(mem) => write!(f, "{}", mem),
            Operand::Literal(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("x_3", Some("x_3"); "ssa name")]
    #[test_case("n_6(D)", Some("n_6"); "default definition")]
    #[test_case("&buf", Some("buf"); "address of")]
    #[test_case("-_4", Some("_4"); "negated temporary")]
    #[test_case("42", None; "integer literal")]
    #[test_case("-1", None; "negative literal")]
    #[test_case("\"%d\\n\"", None; "string literal")]
    #[test_case("MEM[base: p_2, offset: 8B]", Some("p_2"); "mem with base and offset")]
    #[test_case("MEM[(int *)values_4(D) + 4B]", Some("values_4"); "mem shorthand with cast")]
    #[test_case("MEM[(int *)&arr]", Some("arr"); "mem shorthand of address")]
    fn test_var_name(text: &str, want: Option<&str>) {
        assert_eq!(Operand::parse(text).var_name(), want);
    }

    #[test]
    fn test_mem_offset_defaults_to_zero() {
        let mem = ArrayDereference::parse("MEM[(int *)&arr]").unwrap();
        assert_eq!(
            mem,
            ArrayDereference {
                address_of: true,
                name: "arr".to_string(),
                offset: "0".to_string(),
                default_def: false,
            }
        );
        assert_eq!(mem.to_string(), "MEM[base: &arr, offset: 0]");
    }

    #[test]
    fn test_mem_address_of_is_kept() {
        let through_pointer = Operand::parse("MEM[(int *)arr]");
        let of_address = Operand::parse("MEM[(int *)&arr]");
        assert_ne!(through_pointer, of_address);
        assert_eq!(through_pointer.to_string(), "MEM[base: arr, offset: 0]");
        assert_eq!(Operand::parse(&of_address.to_string()), of_address);
        assert_eq!(
            Operand::parse("MEM[base: &arr, offset: 0B]").to_string(),
            "MEM[base: &arr, offset: 0B]"
        );
    }

    #[test]
    fn test_mem_rename_preserves_offset() {
        let mut op = Operand::parse("MEM[(int *)values_4(D) + 4B]");
        let renamed = op.rename_with(&|n: &str| (n == "values_4").then(|| "data_7".to_string()));
        assert!(renamed);
        assert_eq!(op.to_string(), "MEM[base: data_7(D), offset: 4B]");
        assert_eq!(Operand::parse(&op.to_string()), op);
    }

    #[test]
    fn test_rename_keeps_prefix_and_default_marker() {
        let mut op = Operand::parse("&n_6(D)");
        op.rename_with(&|n: &str| (n == "n_6").then(|| "m_2".to_string()));
        assert_eq!(op.to_string(), "&m_2(D)");
    }

    #[test]
    fn test_rename_to_literal_propagates_constant() {
        let mut op = Operand::parse("-_5");
        op.rename_with(&|n: &str| (n == "_5").then(|| "3".to_string()));
        assert_eq!(op, Operand::Literal("-3".to_string()));
        assert_eq!(op.var_name(), None);
    }

    #[test]
    fn test_rename_unrelated_is_noop() {
        let mut op = Operand::parse("x_1");
        assert!(!op.rename_with(&|n: &str| (n == "y_1").then(|| "z_1".to_string())));
        assert_eq!(op, Operand::var("x_1"));
    }
}
